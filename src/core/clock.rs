//! 帧计时与帧率统计

use std::time::{Duration, Instant};

/// 墙钟帧计时器
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    /// 距上一次调用经过的时间
    pub fn tick(&mut self) -> Duration {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> Duration {
        let delta = now.saturating_duration_since(self.last);
        self.last = now;
        delta
    }

    /// 重新开始计时（表面恢复后调用，避免等待期间的时间计入第一帧）
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }
}

/// 帧率计数器，每累计一秒报告一次
#[derive(Debug, Clone, Default)]
pub struct FpsCounter {
    frames: u32,
    elapsed: Duration,
}

impl FpsCounter {
    const PERIOD: Duration = Duration::from_secs(1);

    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次循环迭代；`presented` 表示这一帧确实被呈现
    ///
    /// 累计满一秒时返回这一秒内呈现的帧数。
    pub fn record(&mut self, delta: Duration, presented: bool) -> Option<u32> {
        if presented {
            self.frames += 1;
        }
        self.elapsed += delta;
        if self.elapsed < Self::PERIOD {
            return None;
        }

        let frames = self.frames;
        self.frames = 0;
        self.elapsed -= Self::PERIOD;
        if self.elapsed >= Self::PERIOD {
            // 长时间停顿后不连续报告
            self.elapsed = Duration::ZERO;
        }
        Some(frames)
    }
}
