//! 主循环状态
//!
//! 取消是协作式的：运行标志置为 false 后，在下一次迭代开始时才被观察到，
//! 不会打断正在录制的帧。

/// 一次循环迭代要做的事
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Iteration {
    /// 退出，不再录制或提交任何帧
    Exit,
    /// 没有可渲染的表面，阻塞等待平台事件
    Wait,
    /// 推进模拟并渲染一帧
    Frame,
}

/// 运行标志与等待标志
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopState {
    run: bool,
    wait: bool,
}

impl Default for LoopState {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopState {
    pub fn new() -> Self {
        Self {
            run: true,
            wait: false,
        }
    }

    pub fn request_exit(&mut self) {
        self.run = false;
    }

    pub fn is_running(&self) -> bool {
        self.run
    }

    pub fn set_waiting(&mut self, wait: bool) {
        self.wait = wait;
    }

    pub fn is_waiting(&self) -> bool {
        self.wait
    }

    pub fn next(&self) -> Iteration {
        if !self.run {
            Iteration::Exit
        } else if self.wait {
            Iteration::Wait
        } else {
            Iteration::Frame
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iteration_decision() {
        let mut state = LoopState::new();
        assert_eq!(state.next(), Iteration::Frame);

        state.set_waiting(true);
        assert_eq!(state.next(), Iteration::Wait);

        state.set_waiting(false);
        state.request_exit();
        assert_eq!(state.next(), Iteration::Exit);
    }

    #[test]
    fn test_exit_wins_over_wait() {
        let mut state = LoopState::new();
        state.set_waiting(true);
        state.request_exit();
        assert_eq!(state.next(), Iteration::Exit);
        assert!(!state.is_running());
    }
}
