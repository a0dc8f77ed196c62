//! 核心模块
//!
//! - `engine` - 主引擎入口和运行循环
//! - `loop_state` - 运行/等待标志
//! - `clock` - 帧计时和帧率统计
//! - `error` - 错误类型定义

pub mod clock;
pub mod engine;
pub mod error;
pub mod loop_state;
#[macro_use]
pub mod macros;

pub use clock::{FpsCounter, FrameClock};
pub use engine::Engine;
pub use error::{EngineError, EngineResult, RenderError, RenderResult};
pub use loop_state::{Iteration, LoopState};
