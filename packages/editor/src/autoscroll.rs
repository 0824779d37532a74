//! # Auto-scroll
//!
//! While dragging near the top or bottom edge of the scroll container, each
//! tick scrolls by a speed proportional to how far the pointer has entered
//! the edge band, capped at the configured maximum.

use crate::collaborators::ScrollContainer;
use crate::DragConfig;
use folio_common::{Point, Rect};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoScroll {
    band: f64,
    max_speed: f64,
}

impl AutoScroll {
    pub fn new(band: f64, max_speed: f64) -> Self {
        Self { band, max_speed }
    }

    pub fn from_config(config: &DragConfig) -> Self {
        Self::new(config.scroll_edge_band, config.scroll_max_speed)
    }

    /// Signed scroll speed for a pointer; negative scrolls up
    pub fn speed(&self, viewport: Rect, pointer: Point) -> f64 {
        if self.band <= 0.0 {
            return 0.0;
        }

        let top_depth = viewport.top + self.band - pointer.y;
        let bottom_depth = pointer.y - (viewport.bottom() - self.band);

        if top_depth > 0.0 {
            -self.max_speed * (top_depth / self.band).min(1.0)
        } else if bottom_depth > 0.0 {
            self.max_speed * (bottom_depth / self.band).min(1.0)
        } else {
            0.0
        }
    }
}

/// Live auto-scroll for one drag session
///
/// Created at drag start and dropped at drag end, whatever the outcome.
#[derive(Debug, Clone)]
pub struct AutoScrollSubscription {
    scroller: AutoScroll,
    pointer: Option<Point>,
}

impl AutoScrollSubscription {
    pub fn new(scroller: AutoScroll) -> Self {
        Self {
            scroller,
            pointer: None,
        }
    }

    pub fn update_pointer(&mut self, pointer: Point) {
        self.pointer = Some(pointer);
    }

    /// Scroll once; returns the distance scrolled
    pub fn tick(&self, container: &mut dyn ScrollContainer) -> f64 {
        let Some(pointer) = self.pointer else {
            return 0.0;
        };

        let speed = self.scroller.speed(container.viewport_rect(), pointer);
        if speed != 0.0 {
            container.scroll_by(speed);
        }
        speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::ScrollRegion;

    fn viewport() -> Rect {
        Rect::from_lwth(0.0, 800.0, 100.0, 600.0)
    }

    #[test]
    fn test_no_scroll_outside_band() {
        let scroller = AutoScroll::new(50.0, 20.0);
        assert_eq!(scroller.speed(viewport(), Point::new(10.0, 400.0)), 0.0);
        assert_eq!(scroller.speed(viewport(), Point::new(10.0, 150.0)), 0.0);
    }

    #[test]
    fn test_speed_grows_with_depth_and_caps() {
        let scroller = AutoScroll::new(50.0, 20.0);
        assert_eq!(scroller.speed(viewport(), Point::new(10.0, 125.0)), -10.0);
        assert_eq!(scroller.speed(viewport(), Point::new(10.0, 100.0)), -20.0);
        assert_eq!(scroller.speed(viewport(), Point::new(10.0, 20.0)), -20.0);
        assert_eq!(scroller.speed(viewport(), Point::new(10.0, 690.0)), 16.0);
        assert_eq!(scroller.speed(viewport(), Point::new(10.0, 900.0)), 20.0);
    }

    #[test]
    fn test_tick_scrolls_container() {
        let mut region = ScrollRegion::new(viewport());
        let mut subscription = AutoScrollSubscription::new(AutoScroll::new(50.0, 20.0));
        assert_eq!(subscription.tick(&mut region), 0.0);

        subscription.update_pointer(Point::new(10.0, 700.0));
        subscription.tick(&mut region);
        subscription.tick(&mut region);
        assert_eq!(region.scroll_offset(), 40.0);
    }
}
