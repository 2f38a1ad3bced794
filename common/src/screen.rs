use crate::reading::Reading;

/// What the operator-facing display should show this tick.
pub enum ScreenView<'a> {
    /// No reading has ever been captured.
    NoData,
    Reading(&'a Reading),
}

/// Best-effort synchronous draw surface. Drawing has no return value; a
/// failed draw only costs one frame.
pub trait Screen {
    fn render(&mut self, view: ScreenView<'_>);
}

/// Screen that writes frames to the log output, for bench runs on a host.
#[derive(Default)]
pub struct ConsoleScreen;

impl Screen for ConsoleScreen {
    fn render(&mut self, view: ScreenView<'_>) {
        match view {
            ScreenView::NoData => log::info!("display: no data"),
            ScreenView::Reading(r) => log::info!(
                "display: {:.2} C | {:.2} % | {:.2} hPa | {:.2} m",
                r.temperature,
                r.humidity,
                r.pressure,
                r.altitude
            ),
        }
    }
}
