//! 输入到模拟参数的桥接
//!
//! 把平台事件翻译为吸引点、吸引强度和触摸集合，
//! 同时把窗口管理手势转交给窗口系统。桥接层只保存状态，不持有窗口或渲染器。

use glam::Vec2;

use crate::platform::{
    KeyCode, Modifiers, MouseButton, SurfaceEvent, ToplevelState, TouchPhase, WindowCommand,
    WindowEdges,
};
use crate::render::targets::SampleCount;

use super::params::{normalize_position, SimulationParams};
use super::touch::TouchSet;

/// 靠近边缘多少像素内的按下会触发缩放而不是移动
pub const RESIZE_BORDER: f32 = 100.0;

/// 桥接层请求主循环执行的动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeAction {
    Window(WindowCommand),
    SampleCount(SampleCount),
    Exit,
}

/// 输入桥接状态
#[derive(Debug, Clone)]
pub struct InputBridge {
    modifiers: Modifiers,
    cursor: Vec2,
    attraction_position: Vec2,
    attraction_strength: f32,
    touches: TouchSet,
    toplevel: ToplevelState,
    decorated: bool,
    window_size: (u32, u32),
}

impl InputBridge {
    pub fn new(window_size: (u32, u32), decorated: bool) -> Self {
        Self {
            modifiers: Modifiers::default(),
            cursor: Vec2::ZERO,
            attraction_position: Vec2::ZERO,
            attraction_strength: 0.0,
            touches: TouchSet::new(),
            toplevel: ToplevelState::Normal,
            decorated,
            window_size,
        }
    }

    pub fn touches(&self) -> &TouchSet {
        &self.touches
    }

    pub fn toplevel_state(&self) -> ToplevelState {
        self.toplevel
    }

    pub fn attraction_strength(&self) -> f32 {
        self.attraction_strength
    }

    /// 吸引点（像素坐标）
    pub fn attraction_position(&self) -> Vec2 {
        self.attraction_position
    }

    pub fn decorated(&self) -> bool {
        self.decorated
    }

    /// 处理单个平台事件
    pub fn handle(&mut self, event: &SurfaceEvent) -> Option<BridgeAction> {
        match event {
            SurfaceEvent::MouseButton { button, pressed } => self.mouse_button(*button, *pressed),
            SurfaceEvent::MouseMove { position } => {
                self.cursor = *position;
                self.attraction_position = *position;
                None
            }
            SurfaceEvent::MouseWheel { .. } | SurfaceEvent::MouseCross { .. } => None,
            SurfaceEvent::Key { key, pressed } => {
                if *pressed {
                    self.key(*key)
                } else {
                    None
                }
            }
            SurfaceEvent::ModifiersChanged(modifiers) => {
                self.modifiers = *modifiers;
                None
            }
            SurfaceEvent::Touch {
                id,
                phase,
                position,
            } => {
                match phase {
                    TouchPhase::Started => self.touches.begin(*id, *position),
                    TouchPhase::Moved => {
                        self.touches.update(*id, *position);
                    }
                    TouchPhase::Ended => {
                        self.touches.end(*id);
                    }
                    TouchPhase::Cancelled => self.touches.cancel(),
                }
                None
            }
            SurfaceEvent::Resized { width, height } => {
                self.window_size = (*width, *height);
                None
            }
            SurfaceEvent::CloseRequested => Some(BridgeAction::Exit),
            SurfaceEvent::StateChanged(state) => {
                self.toplevel = *state;
                None
            }
        }
    }

    fn mouse_button(&mut self, button: MouseButton, pressed: bool) -> Option<BridgeAction> {
        if button != MouseButton::Left {
            return None;
        }

        if pressed && (!self.decorated || self.modifiers.alt) {
            let (width, height) = (self.window_size.0 as f32, self.window_size.1 as f32);
            let pos = self.cursor;
            if pos.x < 0.0 || pos.y < 0.0 || pos.x > width || pos.y > height {
                return None;
            }

            let edges = WindowEdges {
                left: pos.x < RESIZE_BORDER,
                right: pos.x >= RESIZE_BORDER && pos.x > width - RESIZE_BORDER,
                top: pos.y < RESIZE_BORDER,
                bottom: pos.y >= RESIZE_BORDER && pos.y > height - RESIZE_BORDER,
            };

            return if edges.is_none() {
                tracing::info!(target: "input", "Starting to move window");
                Some(BridgeAction::Window(WindowCommand::BeginMove))
            } else {
                tracing::info!(target: "input", "Starting to resize window");
                Some(BridgeAction::Window(WindowCommand::BeginResize(edges)))
            };
        }

        self.attraction_position = self.cursor;
        self.attraction_strength = if pressed { 1.0 } else { 0.0 };
        None
    }

    fn key(&mut self, key: KeyCode) -> Option<BridgeAction> {
        if key == KeyCode::Escape {
            tracing::info!(target: "input", "escape pressed. Closing window and exiting");
            return Some(BridgeAction::Exit);
        }

        if self.modifiers.alt {
            return self.window_gesture(key).map(BridgeAction::Window);
        }

        let samples = match key {
            KeyCode::Num1 => SampleCount::X1,
            KeyCode::Num2 => SampleCount::X2,
            KeyCode::Num4 => SampleCount::X4,
            KeyCode::Num8 => SampleCount::X8,
            _ => return None,
        };
        Some(BridgeAction::SampleCount(samples))
    }

    fn window_gesture(&mut self, key: KeyCode) -> Option<WindowCommand> {
        match key {
            KeyCode::F => {
                tracing::info!(target: "input", "f pressed. Toggling fullscreen");
                Some(self.toggle(ToplevelState::Fullscreen, WindowCommand::Fullscreen))
            }
            KeyCode::N => {
                tracing::info!(target: "input", "n pressed. Resetting window to normal state");
                self.toplevel = ToplevelState::Normal;
                Some(WindowCommand::Normal)
            }
            KeyCode::M => {
                tracing::info!(target: "input", "m pressed. Toggle window maximize");
                Some(self.toggle(ToplevelState::Maximized, WindowCommand::Maximize))
            }
            KeyCode::I => {
                tracing::info!(target: "input", "i pressed. Minimizing window");
                self.toplevel = ToplevelState::Minimized;
                Some(WindowCommand::Minimize)
            }
            KeyCode::D => {
                tracing::info!(target: "input", "d pressed. Trying to toggle decorations");
                self.decorated = !self.decorated;
                Some(WindowCommand::SetDecorations(self.decorated))
            }
            _ => None,
        }
    }

    fn toggle(&mut self, state: ToplevelState, enter: WindowCommand) -> WindowCommand {
        if self.toplevel != state {
            self.toplevel = state;
            enter
        } else {
            self.toplevel = ToplevelState::Normal;
            WindowCommand::Normal
        }
    }

    /// 当前所有候选吸引点（像素坐标）：按下的主指针以及所有活动触摸点
    pub fn attraction_sources(&self) -> Vec<Vec2> {
        let pointer = (self.attraction_strength > 0.0).then_some(self.attraction_position);
        pointer
            .into_iter()
            .chain(self.touches.iter().map(|t| t.position))
            .collect()
    }

    /// 生成本帧的模拟参数
    ///
    /// 只消费一个吸引点：按下的主指针优先，否则使用最早的活动触摸点。
    pub fn simulation_params(&self, delta_time: f32, width: u32, height: u32) -> SimulationParams {
        let (strength, pixel) = if self.attraction_strength > 0.0 {
            (self.attraction_strength, self.attraction_position)
        } else if let Some(touch) = self.touches.first() {
            (1.0, touch.position)
        } else {
            (0.0, self.attraction_position)
        };

        SimulationParams::new(delta_time, strength, normalize_position(pixel, width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bridge() -> InputBridge {
        InputBridge::new((800, 600), true)
    }

    fn press_left(bridge: &mut InputBridge, pressed: bool) -> Option<BridgeAction> {
        bridge.handle(&SurfaceEvent::MouseButton {
            button: MouseButton::Left,
            pressed,
        })
    }

    fn with_alt(bridge: &mut InputBridge) {
        bridge.handle(&SurfaceEvent::ModifiersChanged(Modifiers {
            alt: true,
            ..Default::default()
        }));
    }

    #[test]
    fn test_press_and_release_toggle_attraction() {
        let mut bridge = bridge();
        bridge.handle(&SurfaceEvent::MouseMove {
            position: Vec2::new(600.0, 450.0),
        });
        assert_eq!(press_left(&mut bridge, true), None);
        assert_eq!(bridge.attraction_strength(), 1.0);

        let params = bridge.simulation_params(0.016, 800, 600);
        assert_eq!(params.attraction_strength, 1.0);
        assert_eq!(params.attraction_position, [0.5, 0.5]);

        press_left(&mut bridge, false);
        assert_eq!(bridge.attraction_strength(), 0.0);
    }

    #[test]
    fn test_move_only_updates_position() {
        let mut bridge = bridge();
        bridge.handle(&SurfaceEvent::MouseMove {
            position: Vec2::new(10.0, 20.0),
        });
        assert_eq!(bridge.attraction_position(), Vec2::new(10.0, 20.0));
        assert_eq!(bridge.attraction_strength(), 0.0);
    }

    #[test]
    fn test_alt_press_near_edge_begins_resize() {
        let mut bridge = bridge();
        with_alt(&mut bridge);
        bridge.handle(&SurfaceEvent::MouseMove {
            position: Vec2::new(790.0, 10.0),
        });

        let action = press_left(&mut bridge, true);
        assert_eq!(
            action,
            Some(BridgeAction::Window(WindowCommand::BeginResize(WindowEdges {
                right: true,
                top: true,
                ..Default::default()
            })))
        );
        assert_eq!(bridge.attraction_strength(), 0.0);
    }

    #[test]
    fn test_undecorated_press_in_center_begins_move() {
        let mut bridge = InputBridge::new((800, 600), false);
        bridge.handle(&SurfaceEvent::MouseMove {
            position: Vec2::new(400.0, 300.0),
        });
        assert_eq!(
            press_left(&mut bridge, true),
            Some(BridgeAction::Window(WindowCommand::BeginMove))
        );
    }

    #[test]
    fn test_sample_count_keys_without_modifier() {
        let mut bridge = bridge();
        let action = bridge.handle(&SurfaceEvent::Key {
            key: KeyCode::Num4,
            pressed: true,
        });
        assert_eq!(action, Some(BridgeAction::SampleCount(SampleCount::X4)));

        let released = bridge.handle(&SurfaceEvent::Key {
            key: KeyCode::Num8,
            pressed: false,
        });
        assert_eq!(released, None);
    }

    #[test]
    fn test_window_gestures_with_alt() {
        let mut bridge = bridge();
        with_alt(&mut bridge);
        let key = |bridge: &mut InputBridge, key| {
            bridge.handle(&SurfaceEvent::Key { key, pressed: true })
        };

        assert_eq!(
            key(&mut bridge, KeyCode::F),
            Some(BridgeAction::Window(WindowCommand::Fullscreen))
        );
        assert_eq!(bridge.toplevel_state(), ToplevelState::Fullscreen);
        assert_eq!(
            key(&mut bridge, KeyCode::F),
            Some(BridgeAction::Window(WindowCommand::Normal))
        );
        assert_eq!(
            key(&mut bridge, KeyCode::M),
            Some(BridgeAction::Window(WindowCommand::Maximize))
        );
        assert_eq!(
            key(&mut bridge, KeyCode::I),
            Some(BridgeAction::Window(WindowCommand::Minimize))
        );
        assert_eq!(
            key(&mut bridge, KeyCode::D),
            Some(BridgeAction::Window(WindowCommand::SetDecorations(false)))
        );
        assert_eq!(
            key(&mut bridge, KeyCode::N),
            Some(BridgeAction::Window(WindowCommand::Normal))
        );
        // alt + digit is not a sample count switch
        assert_eq!(key(&mut bridge, KeyCode::Num2), None);
    }

    #[test]
    fn test_escape_and_close_request_exit() {
        let mut bridge = bridge();
        assert_eq!(
            bridge.handle(&SurfaceEvent::Key {
                key: KeyCode::Escape,
                pressed: true
            }),
            Some(BridgeAction::Exit)
        );
        assert_eq!(
            bridge.handle(&SurfaceEvent::CloseRequested),
            Some(BridgeAction::Exit)
        );
    }

    #[test]
    fn test_touch_drives_attraction_when_pointer_idle() {
        let mut bridge = bridge();
        bridge.handle(&SurfaceEvent::Touch {
            id: 3,
            phase: TouchPhase::Started,
            position: Vec2::new(0.0, 0.0),
        });

        let params = bridge.simulation_params(0.016, 800, 600);
        assert_eq!(params.attraction_strength, 1.0);
        assert_eq!(params.attraction_position, [-1.0, -1.0]);
        assert_eq!(bridge.attraction_sources(), vec![Vec2::ZERO]);

        bridge.handle(&SurfaceEvent::Touch {
            id: 3,
            phase: TouchPhase::Ended,
            position: Vec2::ZERO,
        });
        assert!(bridge.touches().is_empty());
        assert_eq!(bridge.simulation_params(0.016, 800, 600).attraction_strength, 0.0);
    }

    #[test]
    fn test_pointer_takes_precedence_over_touches() {
        let mut bridge = bridge();
        bridge.handle(&SurfaceEvent::Touch {
            id: 1,
            phase: TouchPhase::Started,
            position: Vec2::new(0.0, 0.0),
        });
        bridge.handle(&SurfaceEvent::MouseMove {
            position: Vec2::new(800.0, 600.0),
        });
        press_left(&mut bridge, true);

        let params = bridge.simulation_params(0.016, 800, 600);
        assert_eq!(params.attraction_position, [1.0, 1.0]);
        assert_eq!(bridge.attraction_sources().len(), 2);
    }
}
