//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod dhcp;
pub mod forward;
pub mod http;
pub mod intake;
pub mod net;
pub mod radio;
pub mod ui;
pub mod wifi;

pub use dhcp::dhcp_task;
pub use forward::forward_task;
pub use http::http_task;
pub use intake::intake_task;
pub use net::net_task;
pub use radio::radio_task;
pub use ui::ui_task;
pub use wifi::wifi_task;
