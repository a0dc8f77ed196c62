//! 引擎主入口
//!
//! [`Engine`] 是唯一的顶层所有者：按值持有帧驱动（渲染器与交换链）、GPU 上下文和窗口。
//! 字段按这个顺序声明，析构时表面先于设备、设备先于窗口释放。
//! 输入桥接层只保存状态，不引用其他组件。

use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};

use crate::config::EngineConfig;
use crate::platform::winit::WinitWindow;
use crate::platform::SurfaceEvent;
use crate::render::{FrameDriver, FrameStatus, GpuContext, ParticleRenderer, RendererState};
use crate::simulation::{BridgeAction, InputBridge};

use super::clock::{FpsCounter, FrameClock};
use super::error::{EngineError, EngineResult};
use super::loop_state::{Iteration, LoopState};

/// 窗口标题
pub const WINDOW_TITLE: &str = "gpu particles";

/// 引擎
///
/// 生命周期：
/// 1. **初始化**：加载配置、创建窗口、设备、交换链和两条管线，任何失败都从 `run` 返回
/// 2. **运行**：每次迭代处理事件、推进模拟、录制并呈现一帧
/// 3. **关闭**：运行标志置为 false 后的下一次迭代退出循环
pub struct Engine {
    driver: FrameDriver<ParticleRenderer>,
    gpu: GpuContext,
    window: WinitWindow,
    config: EngineConfig,
    bridge: InputBridge,
    loop_state: LoopState,
    clock: FrameClock,
    fps: FpsCounter,
    failure: Option<EngineError>,
}

impl Engine {
    /// 运行引擎主循环
    pub fn run() -> EngineResult<()> {
        let (mut config, source) = EngineConfig::load_or_default();
        config.apply_env_overrides();
        Self::initialize_logging(&config);

        match source {
            Some(path) => tracing::info!(target: "config", "Loaded config from {}", path.display()),
            None => tracing::info!(target: "config", "Using default config"),
        }
        config.validate()?;

        let event_loop = EventLoop::new()
            .map_err(|e| EngineError::EventLoop(format!("Failed to create event loop: {}", e)))?;
        let mut engine = Self::initialize(&event_loop, config)?;

        let result = event_loop.run(|event, elwt| engine.handle_event(event, elwt));
        result.map_err(|e| EngineError::EventLoop(format!("Event loop error: {}", e)))?;

        if let Some(failure) = engine.failure.take() {
            return Err(failure);
        }
        tracing::info!(target: "engine", "Exiting");
        Ok(())
    }

    /// 初始化日志系统
    ///
    /// `RUST_LOG` 优先，否则使用配置中的级别。
    fn initialize_logging(config: &EngineConfig) {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new(config.logging.level.as_directive())
        });
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
        tracing::info!(target: "engine", "Engine starting");
    }

    /// 创建窗口、设备和渲染器
    fn initialize(event_loop: &EventLoop<()>, config: EngineConfig) -> EngineResult<Self> {
        let resolution = config.graphics.resolution;
        let window = WinitWindow::try_new(
            event_loop,
            WINDOW_TITLE,
            (resolution.width, resolution.height),
        )
        .map_err(|e| EngineError::Window(e.to_string()))?;

        let instance = GpuContext::create_instance();
        let surface = GpuContext::create_surface(&instance, window.arc())?;
        let gpu = pollster::block_on(GpuContext::new(instance, Some(&surface)))?;

        let driver = FrameDriver::new(
            &gpu,
            surface,
            window.size(),
            config.graphics.sample_count,
            config.graphics.vsync,
            |gpu, _desc| ParticleRenderer::new(gpu, &config.graphics, &config.simulation),
        )?;

        let bridge = InputBridge::new(window.size(), window.decorated());

        Ok(Self {
            driver,
            gpu,
            window,
            config,
            bridge,
            loop_state: LoopState::new(),
            clock: FrameClock::new(),
            fps: FpsCounter::new(),
            failure: None,
        })
    }

    fn handle_event(&mut self, event: Event<()>, elwt: &EventLoopWindowTarget<()>) {
        match event {
            Event::Resumed => self.on_surface_created(),
            Event::Suspended => self.on_surface_destroyed(),
            Event::WindowEvent { event, .. } => self.on_window_event(&event),
            Event::AboutToWait => match self.loop_state.next() {
                Iteration::Exit => elwt.exit(),
                Iteration::Wait => elwt.set_control_flow(ControlFlow::Wait),
                Iteration::Frame => {
                    elwt.set_control_flow(ControlFlow::Poll);
                    self.frame();
                }
            },
            Event::LoopExiting => {
                self.gpu.wait_idle();
            }
            _ => {}
        }
    }

    fn on_window_event(&mut self, event: &WindowEvent) {
        let Some(event) = WinitWindow::translate(event) else {
            return;
        };

        if let SurfaceEvent::Resized { width, height } = event {
            self.driver.resize(width, height);
            self.bridge
                .handle(&SurfaceEvent::StateChanged(self.window.toplevel_state()));
        }

        match self.bridge.handle(&event) {
            Some(BridgeAction::Exit) => self.loop_state.request_exit(),
            Some(BridgeAction::Window(command)) => self.window.apply(command),
            Some(BridgeAction::SampleCount(samples)) => {
                self.driver.set_sample_count(&self.gpu, samples);
            }
            None => {}
        }
        self.update_waiting();
    }

    fn on_surface_created(&mut self) {
        // 首次 Resumed 时表面已经在初始化阶段建立
        if self.driver.state() == RendererState::Ready {
            return;
        }

        let surface = match GpuContext::create_surface(&self.gpu.instance, self.window.arc()) {
            Ok(surface) => surface,
            Err(e) => return self.fail(e.into()),
        };
        if let Err(e) = self.driver.surface_created(&self.gpu, surface) {
            return self.fail(e.into());
        }
        self.driver.resize(self.window.size().0, self.window.size().1);
        self.clock.reset();
        self.update_waiting();
    }

    fn on_surface_destroyed(&mut self) {
        self.driver.surface_destroyed(&self.gpu);
        self.update_waiting();
    }

    fn update_waiting(&mut self) {
        let renderable =
            self.driver.state() == RendererState::Ready && self.driver.desc().is_renderable();
        self.loop_state.set_waiting(!renderable);
    }

    /// 推进一帧：计算时间差、生成模拟参数、录制并呈现
    fn frame(&mut self) {
        let delta = self.clock.tick();
        let (width, height) = self.driver.desc().extent;

        tracing::trace!(
            target: "engine",
            "{} attraction sources",
            self.bridge.attraction_sources().len()
        );
        let params = self
            .bridge
            .simulation_params(delta.as_secs_f32(), width, height);
        self.driver.recorder_mut().set_params(params);

        let presented = match self.driver.render_frame(&self.gpu) {
            Ok(status) => status == FrameStatus::Presented,
            Err(e) => return self.fail(e.into()),
        };

        if let Some(fps) = self.fps.record(delta, presented) {
            if self.config.simulation.report_fps {
                tracing::info!(target: "engine", "{} fps", fps);
            }
        }
    }

    /// 运行期不可恢复的错误：记录并结束循环
    fn fail(&mut self, error: EngineError) {
        tracing::error!(target: "engine", "{}", error);
        self.failure.get_or_insert(error);
        self.loop_state.request_exit();
    }
}
