//! Terminal rendering of a dropdown
//!
//! Renders the state held by a [`ListView`] as plain lines, optionally
//! colored with ANSI escapes. Class names from the configuration label the
//! input, the list and the active item so the output mirrors what a markup
//! view would produce.

use nu_ansi_term::{Color, Style};

use crate::config::Config;
use crate::typeahead::ListView;

/// Renders dropdown snapshots
pub struct DropdownRenderer {
    /// Whether to emit ANSI escapes
    use_colors: bool,
    input_style: Style,
    active_style: Style,
    item_style: Style,
    label_style: Style,
    error_style: Style,
}

impl DropdownRenderer {
    /// Create a new renderer
    ///
    /// # Arguments
    /// * `use_colors` - Whether to enable colored output
    ///
    /// # Returns
    /// * `Self` - New renderer
    pub fn new(use_colors: bool) -> Self {
        Self {
            use_colors,
            input_style: Style::new().bold().fg(Color::Cyan),
            active_style: Style::new().bold().fg(Color::Black).on(Color::Green),
            item_style: Style::new().fg(Color::White),
            label_style: Style::new().italic().fg(Color::DarkGray),
            error_style: Style::new().bold().fg(Color::Red),
        }
    }

    fn paint(&self, style: Style, text: &str) -> String {
        if self.use_colors {
            style.paint(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Render the input line and, when visible, the dropdown
    ///
    /// # Arguments
    /// * `view` - View holding the displayed state
    /// * `text` - What the input shows
    /// * `project` - Text of a candidate
    /// * `config` - Class names to label the output with
    ///
    /// # Returns
    /// * `String` - Rendered lines, newline separated
    pub fn render<T>(
        &self,
        view: &ListView<T>,
        text: &str,
        project: impl Fn(&T) -> String,
        config: &Config,
    ) -> String {
        let mut lines = vec![format!(
            "{} {}",
            self.paint(self.input_style, &format!("[{}]", text)),
            self.paint(self.label_style, &format!(".{}", config.input_class)),
        )];

        if view.is_visible() {
            lines.push(format!(
                "  {}",
                self.paint(self.label_style, &format!(".{}", config.list_class))
            ));
            for node in view.nodes() {
                let label = project(&node.candidate);
                if view.active() == Some(node.id) {
                    lines.push(format!(
                        "  > {} {}",
                        self.paint(self.active_style, &label),
                        self.paint(self.label_style, &format!(".{}", config.active_class)),
                    ));
                } else {
                    lines.push(format!("    {}", self.paint(self.item_style, &label)));
                }
            }
        }

        if let Some(error) = view.errors().last() {
            lines.push(self.paint(self.error_style, &format!("  ! {error}")));
        }

        lines.join("\n")
    }
}
