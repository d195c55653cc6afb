use log::warn;
use zoneforge_editor::Dialogs;

/// `window.confirm` / `window.alert`
pub struct WindowDialogs;

impl Dialogs for WindowDialogs {
    fn confirm(&self, message: &str) -> bool {
        match web_sys::window().map(|window| window.confirm_with_message(message)) {
            Some(Ok(answer)) => answer,
            _ => {
                warn!("confirm dialog unavailable, treating as declined");
                false
            }
        }
    }

    fn alert(&self, message: &str) {
        if let Some(window) = web_sys::window() {
            if window.alert_with_message(message).is_err() {
                warn!("alert dialog unavailable: {}", message);
            }
        }
    }
}
