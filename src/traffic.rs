//! Traffic interface (§6.1): the boundary between the event kernel and
//! whatever produces vehicle movement. A microscopic road-traffic engine is
//! out of scope — this module only ships the default simulated-timer
//! implementation, reduced to a closed-form ramp-acceleration profile.

use bevy_ecs::prelude::Resource;

use crate::route::RouteConfig;

/// Required collaborator the dispatcher/bus state machine calls into to
/// learn how long travel between two stops takes. A real deployment could
/// implement this against a live road-traffic feed; this crate ships only
/// [`SimulatedTraffic`].
pub trait TrafficInterface: Send + Sync {
    /// Seconds to travel `from_stop -> from_stop + 1` on `route`, departing
    /// at `depart_time` (seconds). Must be finite and non-negative;
    /// negative or non-finite results are a traffic-interface fault (§7),
    /// logged and treated as the bus disappearing rather than propagated.
    fn travel_time(&self, route: &RouteConfig, from_stop: usize, depart_time: u64) -> f64;
}

/// Ramp-acceleration profile: accelerate at `accel_mps2` up to
/// `max_speed_kmh`, cruise, decelerate at `decel_mps2` to a stop. If the
/// distance is too short to reach `max_speed_kmh`, the profile degrades to
/// a triangular accelerate/decelerate curve that peaks below max speed.
#[derive(Debug, Clone, Copy, Resource)]
pub struct SimulatedTraffic {
    pub accel_mps2: f64,
    pub decel_mps2: f64,
    pub max_speed_kmh: f64,
}

impl Default for SimulatedTraffic {
    fn default() -> Self {
        Self {
            accel_mps2: 1.2,
            decel_mps2: 1.5,
            max_speed_kmh: 45.0,
        }
    }
}

impl SimulatedTraffic {
    pub fn max_speed_mps(&self) -> f64 {
        self.max_speed_kmh * 1000.0 / 3600.0
    }

    /// Closed-form travel time for a trapezoidal (or, when too short,
    /// triangular) velocity profile over `distance_m`.
    pub fn ramp_travel_time(&self, distance_m: f64) -> f64 {
        if distance_m <= 0.0 {
            return 0.0;
        }
        let v_max = self.max_speed_mps();
        let accel_dist = v_max * v_max / (2.0 * self.accel_mps2);
        let decel_dist = v_max * v_max / (2.0 * self.decel_mps2);

        if accel_dist + decel_dist <= distance_m {
            let cruise_dist = distance_m - accel_dist - decel_dist;
            v_max / self.accel_mps2 + v_max / self.decel_mps2 + cruise_dist / v_max
        } else {
            // Triangular profile: solve for the peak speed reached before
            // deceleration must begin, from accel_dist' + decel_dist' = D.
            let v_peak = (2.0 * distance_m * self.accel_mps2 * self.decel_mps2
                / (self.accel_mps2 + self.decel_mps2))
                .sqrt();
            v_peak / self.accel_mps2 + v_peak / self.decel_mps2
        }
    }
}

impl TrafficInterface for SimulatedTraffic {
    fn travel_time(&self, route: &RouteConfig, from_stop: usize, _depart_time: u64) -> f64 {
        let distance = route.distance_to_next(from_stop).unwrap_or(0.0);
        self.ramp_travel_time(distance)
    }
}

/// Type-erased handle for a pluggable traffic provider, following the same
/// boxed-trait-object pattern used by [`crate::dispatch::DispatcherResource`].
#[derive(Resource)]
pub struct TrafficResource(pub Box<dyn TrafficInterface>);

impl std::ops::Deref for TrafficResource {
    type Target = dyn TrafficInterface;
    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trapezoidal_profile_reaches_max_speed() {
        let traffic = SimulatedTraffic {
            accel_mps2: 1.0,
            decel_mps2: 1.0,
            max_speed_kmh: 36.0, // 10 m/s
        };
        // accel/decel distance each: 10*10/(2*1) = 50m, so 200m has 100m cruise.
        let t = traffic.ramp_travel_time(200.0);
        assert!((t - (10.0 + 10.0 + 10.0)).abs() < 1e-9);
    }

    #[test]
    fn triangular_profile_for_short_distance() {
        let traffic = SimulatedTraffic {
            accel_mps2: 1.0,
            decel_mps2: 1.0,
            max_speed_kmh: 360.0, // 100 m/s, unreachable over short hops
        };
        let t = traffic.ramp_travel_time(50.0);
        assert!(t > 0.0);
        assert!(t < 100.0);
    }

    #[test]
    fn zero_distance_is_instantaneous() {
        let traffic = SimulatedTraffic::default();
        assert_eq!(traffic.ramp_travel_time(0.0), 0.0);
    }
}
