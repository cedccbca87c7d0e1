use crate::config::SimConfig;
use crate::types::{GhostMode, RuntimeEvent};

use super::hunters::Hunter;

/// Alternates the global scatter/chase mode on a timer and warns the
/// hunters shortly before each flip.
#[derive(Clone, Debug)]
pub(crate) struct ModeCoordinator {
    mode: GhostMode,
    elapsed_ms: u64,
    warned: bool,
}

impl Default for ModeCoordinator {
    fn default() -> Self {
        Self {
            mode: GhostMode::Chase,
            elapsed_ms: 0,
            warned: false,
        }
    }
}

impl ModeCoordinator {
    pub fn mode(&self) -> GhostMode {
        self.mode
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    fn duration_ms(&self, config: &SimConfig) -> u64 {
        match self.mode {
            GhostMode::Scatter => config.scatter_duration_ms,
            GhostMode::Chase => config.chase_duration_ms,
        }
    }

    pub fn advance(
        &mut self,
        dt_ms: u64,
        now_ms: u64,
        config: &SimConfig,
        hunters: &mut [Hunter],
        events: &mut Vec<RuntimeEvent>,
    ) {
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);
        let duration = self.duration_ms(config);
        let remaining = duration.saturating_sub(self.elapsed_ms);

        if !self.warned && remaining <= config.mode_warning_ms {
            self.warned = true;
            for hunter in hunters.iter_mut() {
                hunter.start_signal(now_ms, config.signal_duration_ms);
            }
            events.push(RuntimeEvent::ModeWarningStarted { mode: self.mode });
        }

        if self.elapsed_ms >= duration {
            self.mode = self.mode.toggled();
            self.elapsed_ms = 0;
            self.warned = false;
            for hunter in hunters.iter_mut() {
                hunter.reversal_permitted = true;
                hunter.clear_signal();
            }
            tracing::debug!(mode = ?self.mode, "hunter mode changed");
            events.push(RuntimeEvent::ModeChanged { mode: self.mode });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::hunters::HunterSpec;
    use crate::types::{BehaviorVariant, Vec2};

    fn hunters() -> Vec<Hunter> {
        vec![Hunter::spawn(HunterSpec {
            id: "h".to_string(),
            behavior: BehaviorVariant::Chase,
            home: Vec2 { x: 1, y: 1 },
            exit_delay_ms: 0,
            aggression: 1.0,
            scatter_target: Vec2 { x: 0, y: 0 },
        })]
    }

    #[test]
    fn starts_in_chase_and_warns_once_before_flip() {
        let config = SimConfig::default();
        let mut coordinator = ModeCoordinator::default();
        let mut hunters = hunters();
        let mut events = Vec::new();
        assert_eq!(coordinator.mode(), GhostMode::Chase);

        coordinator.advance(17_999, 17_999, &config, &mut hunters, &mut events);
        assert!(events.is_empty());

        coordinator.advance(1, 18_000, &config, &mut hunters, &mut events);
        assert_eq!(
            events,
            vec![RuntimeEvent::ModeWarningStarted {
                mode: GhostMode::Chase
            }]
        );
        assert!(hunters[0].signal.active);
        assert_eq!(hunters[0].signal.started_at_ms, 18_000);

        coordinator.advance(1_000, 19_000, &config, &mut hunters, &mut events);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn flip_toggles_mode_and_grants_reversal() {
        let config = SimConfig::default();
        let mut coordinator = ModeCoordinator::default();
        let mut hunters = hunters();
        let mut events = Vec::new();

        coordinator.advance(20_000, 20_000, &config, &mut hunters, &mut events);
        assert_eq!(coordinator.mode(), GhostMode::Scatter);
        assert_eq!(coordinator.elapsed_ms(), 0);
        assert!(hunters[0].reversal_permitted);
        assert!(!hunters[0].signal.active);
        assert_eq!(
            events.last(),
            Some(&RuntimeEvent::ModeChanged {
                mode: GhostMode::Scatter
            })
        );

        // 3 s scatter: the 2 s warning starts one second in
        events.clear();
        coordinator.advance(1_000, 21_000, &config, &mut hunters, &mut events);
        assert_eq!(
            events,
            vec![RuntimeEvent::ModeWarningStarted {
                mode: GhostMode::Scatter
            }]
        );
        coordinator.advance(2_000, 23_000, &config, &mut hunters, &mut events);
        assert_eq!(coordinator.mode(), GhostMode::Chase);
    }
}
