use gpu_particles::EngineError;

fn report(error: &EngineError) -> String {
    format!("Engine error: {}", error)
}

fn main() {
    if let Err(e) = gpu_particles::core::Engine::run() {
        eprintln!("{}", report(&e));
        std::process::exit(1);
    }
}
