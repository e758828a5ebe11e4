/// Horizontal bar chart for the statistics view
/// Used for the genre and status distributions
use iced::widget::canvas::{self, Text};
use iced::{Color, Pixels, Point, Rectangle, Size};

use crate::Message;

/// Height of one bar row, including spacing
pub const ROW_HEIGHT: f32 = 26.0;

/// Width reserved for labels on the left
const LABEL_WIDTH: f32 = 140.0;

#[derive(Debug, Clone)]
pub struct BarChart {
    /// (label, count), drawn top to bottom
    pub bars: Vec<(String, usize)>,
    pub color: Color,
}

impl BarChart {
    pub fn new(bars: Vec<(String, usize)>, color: Color) -> Self {
        Self { bars, color }
    }

    /// Canvas height needed to show every bar
    pub fn height(&self) -> f32 {
        ROW_HEIGHT * self.bars.len().max(1) as f32
    }
}

impl canvas::Program<Message> for BarChart {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &iced::Renderer,
        _theme: &iced::Theme,
        bounds: Rectangle,
        _cursor: iced::mouse::Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        // Longest bar spans the full width
        let max_count = self.bars.iter().map(|(_, count)| *count).max().unwrap_or(0);
        if max_count == 0 {
            return vec![frame.into_geometry()];
        }

        let total: usize = self.bars.iter().map(|(_, count)| count).sum();
        let bar_space = (bounds.width - LABEL_WIDTH - 60.0).max(10.0);

        for (i, (label, count)) in self.bars.iter().enumerate() {
            let y = i as f32 * ROW_HEIGHT;
            let label = if label.is_empty() { "(unspecified)" } else { label.as_str() };

            frame.fill_text(Text {
                content: label.to_string(),
                position: Point::new(0.0, y + 4.0),
                color: Color::WHITE,
                size: Pixels(14.0),
                ..Text::default()
            });

            let width = *count as f32 / max_count as f32 * bar_space;
            frame.fill_rectangle(
                Point::new(LABEL_WIDTH, y + 3.0),
                Size::new(width, ROW_HEIGHT - 6.0),
                self.color,
            );

            let share = *count as f32 / total as f32 * 100.0;
            frame.fill_text(Text {
                content: format!("{count} ({share:.1}%)"),
                position: Point::new(LABEL_WIDTH + width + 6.0, y + 4.0),
                color: Color::from_rgb(0.8, 0.8, 0.8),
                size: Pixels(13.0),
                ..Text::default()
            });
        }

        vec![frame.into_geometry()]
    }
}
