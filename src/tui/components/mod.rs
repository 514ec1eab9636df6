mod input_box;
mod message;
mod message_list;

pub use input_box::{InputBox, InputEvent};
pub use message::BubbleView;
pub use message_list::{MessageList, MessageListState};
