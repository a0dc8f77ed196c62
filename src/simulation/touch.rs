//! 多点触控跟踪

use glam::Vec2;

/// 单个活动触摸点
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub id: u64,
    pub position: Vec2,
}

/// 按 id 区分的触摸点集合，保持按下顺序
#[derive(Debug, Clone, Default)]
pub struct TouchSet {
    points: Vec<TouchPoint>,
}

impl TouchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 触摸开始；id 已存在时更新位置并记录警告
    pub fn begin(&mut self, id: u64, position: Vec2) {
        if let Some(point) = self.find_mut(id) {
            tracing::warn!(target: "input", "Touch begin with already known id {}", id);
            point.position = position;
            return;
        }
        self.points.push(TouchPoint { id, position });
    }

    /// 触摸移动；未知 id 时返回 `false`
    pub fn update(&mut self, id: u64, position: Vec2) -> bool {
        match self.find_mut(id) {
            Some(point) => {
                point.position = position;
                true
            }
            None => {
                tracing::warn!(target: "input", "Touch update for unknown id {}", id);
                false
            }
        }
    }

    /// 触摸结束；未知 id 时返回 `false`
    pub fn end(&mut self, id: u64) -> bool {
        match self.points.iter().position(|p| p.id == id) {
            Some(index) => {
                self.points.remove(index);
                true
            }
            None => {
                tracing::warn!(target: "input", "Touch end for unknown id {}", id);
                false
            }
        }
    }

    /// 取消所有触摸
    pub fn cancel(&mut self) {
        self.points.clear();
    }

    pub fn get(&self, id: u64) -> Option<&TouchPoint> {
        self.points.iter().find(|p| p.id == id)
    }

    pub fn first(&self) -> Option<&TouchPoint> {
        self.points.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TouchPoint> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn find_mut(&mut self, id: u64) -> Option<&mut TouchPoint> {
        self.points.iter_mut().find(|p| p.id == id)
    }
}
