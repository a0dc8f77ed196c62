use std::sync::Arc;

use glam::Vec2;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::event_loop::EventLoopWindowTarget;
use winit::keyboard::PhysicalKey;
use winit::window::{Fullscreen, ResizeDirection, Window as WinitWindowRaw, WindowBuilder};

use super::{
    KeyCode, Modifiers, MouseButton, SurfaceEvent, ToplevelState, TouchPhase, WindowCommand,
    WindowEdges,
};

/// winit 窗口包装
///
/// 持有 `Arc`，以便 wgpu 表面可以获得 `'static` 生命周期。
#[derive(Clone)]
pub struct WinitWindow {
    window: Arc<WinitWindowRaw>,
}

impl WinitWindow {
    pub fn try_new(
        target: &EventLoopWindowTarget<()>,
        title: &str,
        size: (u32, u32),
    ) -> Result<Self, winit::error::OsError> {
        let window = WindowBuilder::new()
            .with_title(title)
            .with_inner_size(PhysicalSize::new(size.0, size.1))
            .build(target)?;
        Ok(Self {
            window: Arc::new(window),
        })
    }

    pub fn arc(&self) -> Arc<WinitWindowRaw> {
        Arc::clone(&self.window)
    }

    pub fn size(&self) -> (u32, u32) {
        let s = self.window.inner_size();
        (s.width, s.height)
    }

    pub fn decorated(&self) -> bool {
        self.window.is_decorated()
    }

    pub fn toplevel_state(&self) -> ToplevelState {
        if self.window.fullscreen().is_some() {
            ToplevelState::Fullscreen
        } else if self.window.is_minimized().unwrap_or(false) {
            ToplevelState::Minimized
        } else if self.window.is_maximized() {
            ToplevelState::Maximized
        } else {
            ToplevelState::Normal
        }
    }

    /// 执行窗口管理请求
    pub fn apply(&self, command: WindowCommand) {
        let result = match command {
            WindowCommand::BeginMove => self.window.drag_window(),
            WindowCommand::BeginResize(edges) => match resize_direction(edges) {
                Some(direction) => self.window.drag_resize_window(direction),
                None => Ok(()),
            },
            WindowCommand::Fullscreen => {
                self.window.set_fullscreen(Some(Fullscreen::Borderless(None)));
                Ok(())
            }
            WindowCommand::Maximize => {
                self.window.set_maximized(true);
                Ok(())
            }
            WindowCommand::Minimize => {
                self.window.set_minimized(true);
                Ok(())
            }
            WindowCommand::Normal => {
                self.window.set_fullscreen(None);
                self.window.set_maximized(false);
                self.window.set_minimized(false);
                Ok(())
            }
            WindowCommand::SetDecorations(decorated) => {
                self.window.set_decorations(decorated);
                Ok(())
            }
        };

        if let Err(e) = result {
            tracing::warn!(target: "platform", "Window command {:?} failed: {}", command, e);
        }
    }

    /// 把 winit 窗口事件转换为引擎事件
    ///
    /// 不关心的事件返回 `None`。
    pub fn translate(event: &WindowEvent) -> Option<SurfaceEvent> {
        match event {
            WindowEvent::MouseInput { state, button, .. } => Some(SurfaceEvent::MouseButton {
                button: match button {
                    winit::event::MouseButton::Left => MouseButton::Left,
                    winit::event::MouseButton::Right => MouseButton::Right,
                    winit::event::MouseButton::Middle => MouseButton::Middle,
                    winit::event::MouseButton::Back => MouseButton::Other(3),
                    winit::event::MouseButton::Forward => MouseButton::Other(4),
                    winit::event::MouseButton::Other(id) => MouseButton::Other(*id),
                },
                pressed: *state == ElementState::Pressed,
            }),
            WindowEvent::CursorMoved { position, .. } => Some(SurfaceEvent::MouseMove {
                position: Vec2::new(position.x as f32, position.y as f32),
            }),
            WindowEvent::MouseWheel { delta, .. } => Some(SurfaceEvent::MouseWheel {
                delta: match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32,
                },
            }),
            WindowEvent::CursorEntered { .. } => Some(SurfaceEvent::MouseCross { entered: true }),
            WindowEvent::CursorLeft { .. } => Some(SurfaceEvent::MouseCross { entered: false }),
            WindowEvent::KeyboardInput { event, .. } => {
                if event.repeat {
                    return None;
                }
                let key = match event.physical_key {
                    PhysicalKey::Code(code) => translate_key(code),
                    PhysicalKey::Unidentified(_) => KeyCode::Other,
                };
                Some(SurfaceEvent::Key {
                    key,
                    pressed: event.state == ElementState::Pressed,
                })
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                let state = modifiers.state();
                Some(SurfaceEvent::ModifiersChanged(Modifiers {
                    shift: state.shift_key(),
                    ctrl: state.control_key(),
                    alt: state.alt_key(),
                    logo: state.super_key(),
                }))
            }
            WindowEvent::Touch(touch) => Some(SurfaceEvent::Touch {
                id: touch.id,
                phase: match touch.phase {
                    winit::event::TouchPhase::Started => TouchPhase::Started,
                    winit::event::TouchPhase::Moved => TouchPhase::Moved,
                    winit::event::TouchPhase::Ended => TouchPhase::Ended,
                    winit::event::TouchPhase::Cancelled => TouchPhase::Cancelled,
                },
                position: Vec2::new(touch.location.x as f32, touch.location.y as f32),
            }),
            WindowEvent::Resized(size) => Some(SurfaceEvent::Resized {
                width: size.width,
                height: size.height,
            }),
            WindowEvent::CloseRequested => Some(SurfaceEvent::CloseRequested),
            _ => None,
        }
    }
}

fn translate_key(code: winit::keyboard::KeyCode) -> KeyCode {
    use winit::keyboard::KeyCode as Code;
    match code {
        Code::KeyF => KeyCode::F,
        Code::KeyN => KeyCode::N,
        Code::KeyM => KeyCode::M,
        Code::KeyI => KeyCode::I,
        Code::KeyD => KeyCode::D,
        Code::Escape => KeyCode::Escape,
        Code::Digit1 | Code::Numpad1 => KeyCode::Num1,
        Code::Digit2 | Code::Numpad2 => KeyCode::Num2,
        Code::Digit4 | Code::Numpad4 => KeyCode::Num4,
        Code::Digit8 | Code::Numpad8 => KeyCode::Num8,
        _ => KeyCode::Other,
    }
}

fn resize_direction(edges: WindowEdges) -> Option<ResizeDirection> {
    let direction = match (edges.left, edges.right, edges.top, edges.bottom) {
        (true, _, true, _) => ResizeDirection::NorthWest,
        (true, _, _, true) => ResizeDirection::SouthWest,
        (true, _, _, _) => ResizeDirection::West,
        (_, true, true, _) => ResizeDirection::NorthEast,
        (_, true, _, true) => ResizeDirection::SouthEast,
        (_, true, _, _) => ResizeDirection::East,
        (_, _, true, _) => ResizeDirection::North,
        (_, _, _, true) => ResizeDirection::South,
        _ => return None,
    };
    Some(direction)
}
