use crate::hud_log;

/// Sink for the per-tick reachability signal. Implementations must never
/// fail the caller; a tick continues whether or not a HUD is listening.
pub trait HudSink {
    fn show_crosshair(&mut self, item_in_reach: bool);
}

/// Minimal HUD state holder for runtimes without a rendering surface.
/// Remembers the latest crosshair state and logs transitions.
#[derive(Debug, Default)]
pub struct CrosshairHud {
    visible: bool,
}

impl CrosshairHud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visible(&self) -> bool {
        self.visible
    }
}

impl HudSink for CrosshairHud {
    fn show_crosshair(&mut self, item_in_reach: bool) {
        if item_in_reach != self.visible {
            hud_log!(debug, "crosshair {}", if item_in_reach { "on" } else { "off" });
        }
        self.visible = item_in_reach;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crosshair_tracks_latest_signal() {
        let mut hud = CrosshairHud::new();
        assert!(!hud.visible());

        hud.show_crosshair(true);
        assert!(hud.visible());

        hud.show_crosshair(true);
        hud.show_crosshair(false);
        assert!(!hud.visible());
    }
}
