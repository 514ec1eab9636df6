use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};
use ratatui::text::Span;

use crate::core::state::Session;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::MessageList;

pub fn draw_ui(frame: &mut Frame, session: &Session, tui: &mut TuiState) {
    use Constraint::{Length, Min};
    let input_height = tui.input_box.calculate_height(frame.area().width);
    let layout = Layout::vertical([Length(1), Min(0), Length(input_height)]);
    let [title_area, main_area, input_area] = layout.areas(frame.area());

    // Title bar
    let title_text = format!("Parley ({}) | {}", tui.endpoint, session.status_message);
    frame.render_widget(Span::raw(title_text), title_area);

    MessageList::new(&mut tui.message_list, &session.transcript).render(frame, main_area);

    tui.input_box.render(frame, input_area);
}
