pub mod apply;
pub mod info;
pub mod new;
pub mod remote;

pub use apply::{apply, ApplyArgs};
pub use info::{info, InfoArgs};
pub use new::{new_timeline, NewArgs};
pub use remote::{edit, history, pull, push, EditArgs, HistoryArgs, PullArgs, PushArgs};
