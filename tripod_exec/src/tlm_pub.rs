//! # Telemetry publisher
//!
//! Fans telemetry samples out to any number of subscribers, each holding its own queue.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;
use std::sync::mpsc::{channel, Receiver, Sender};

use crate::platform_state::TlmSample;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Distributes telemetry samples to subscribers.
#[derive(Default)]
pub struct TlmPublisher {
    subscribers: Vec<Sender<TlmSample>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TlmPublisher {
    /// Get a new queue which receives every sample published from now on.
    pub fn subscribe(&mut self) -> Receiver<TlmSample> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    /// Send a sample to every subscriber. Subscribers which dropped their queue are forgotten.
    pub fn publish(&mut self, sample: &TlmSample) {
        let before = self.subscribers.len();

        self.subscribers.retain(|s| s.send(*sample).is_ok());

        if self.subscribers.len() != before {
            debug!(
                "{} telemetry subscriber(s) disconnected",
                before - self.subscribers.len()
            );
        }
    }

    #[cfg(test)]
    fn num_subscribers(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::platform_state::PlatformState;
    use crate::kin_ctrl::{params::test::flight_params, KinCtrl};
    use comms_if::eqpt::mech_tlm::MechTlmRecord;

    #[test]
    fn test_publish_to_subscribers() {
        let mut kin = KinCtrl::new(&flight_params()).unwrap();
        let mut platform = PlatformState::default();
        let mut publisher = TlmPublisher::default();

        let rx_a = publisher.subscribe();
        let rx_b = publisher.subscribe();

        let record = MechTlmRecord::parse("@M119 S0 @M120 S0 @M121 S0 @M122 S0 AS4 T9.89 C0")
            .unwrap();
        let sample = platform.apply_record(&mut kin, &record);
        publisher.publish(&sample);

        assert_eq!(rx_a.try_recv().unwrap(), sample);
        assert_eq!(rx_b.try_recv().unwrap(), sample);
        assert!(rx_a.try_recv().is_err());

        // A dropped subscriber is removed on the next publish
        drop(rx_b);
        publisher.publish(&sample);
        assert_eq!(publisher.num_subscribers(), 1);
        assert!(rx_a.try_recv().is_ok());
    }
}
