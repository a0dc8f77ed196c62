//! 平台抽象层
//!
//! 窗口系统是外部协作者：它拥有操作系统事件循环，提供可绘制表面，
//! 并把输入、尺寸变化和生命周期事件转换为 [`SurfaceEvent`]。
//! 反方向上，[`WindowCommand`] 描述由核心发出的窗口管理请求。

pub mod winit;

use glam::Vec2;

// ============================================================================
// Surface Event Stream
// ============================================================================

/// 平台事件（已从具体窗口库转换为引擎类型）
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    // Mouse
    MouseButton { button: MouseButton, pressed: bool },
    MouseMove { position: Vec2 },
    MouseWheel { delta: f32 },
    MouseCross { entered: bool },

    // Keyboard
    Key { key: KeyCode, pressed: bool },
    ModifiersChanged(Modifiers),

    // Touch (mobile/tablet)
    Touch { id: u64, phase: TouchPhase, position: Vec2 },

    // Window
    Resized { width: u32, height: u32 },
    CloseRequested,
    StateChanged(ToplevelState),
}

/// 引擎关心的按键子集
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    F,
    N,
    M,
    I,
    D,
    Escape,
    Num1,
    Num2,
    Num4,
    Num8,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub logo: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchPhase {
    Started,
    Moved,
    Ended,
    Cancelled,
}

/// 顶层窗口状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToplevelState {
    #[default]
    Normal,
    Maximized,
    Minimized,
    Fullscreen,
}

// ============================================================================
// Window Commands
// ============================================================================

/// 交互式缩放时抓取的窗口边缘
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowEdges {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

impl WindowEdges {
    pub fn is_none(&self) -> bool {
        !(self.left || self.right || self.top || self.bottom)
    }
}

/// 发往窗口系统的请求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowCommand {
    BeginMove,
    BeginResize(WindowEdges),
    Fullscreen,
    Maximize,
    Minimize,
    Normal,
    SetDecorations(bool),
}
