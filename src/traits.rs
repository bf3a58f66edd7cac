//! Core seams for the allocation engine.
//!
//! Kept intentionally small. The engine ships a great-circle implementation
//! ([`Haversine`](crate::haversine::Haversine)); tests and embedding apps can
//! substitute their own.

use crate::model::{Facility, GeoPoint, Patient};

/// Provides travel distance in kilometres between two locations.
///
/// Implementations must be deterministic and side-effect free: the same pair
/// is evaluated by solvers, by the explanation layer and by the simulator, and
/// all of them must agree.
pub trait DistanceProvider: Sync {
    fn distance_km(&self, from: GeoPoint, to: GeoPoint) -> f64;

    /// Distance matrix from every origin to every destination.
    ///
    /// The matrix is indexed `[origin][destination]` in the provided order.
    fn matrix_for(&self, origins: &[GeoPoint], destinations: &[GeoPoint]) -> Vec<Vec<f64>> {
        origins
            .iter()
            .map(|from| {
                destinations
                    .iter()
                    .map(|to| self.distance_km(*from, *to))
                    .collect()
            })
            .collect()
    }
}

impl<T: DistanceProvider + ?Sized> DistanceProvider for &T {
    fn distance_km(&self, from: GeoPoint, to: GeoPoint) -> f64 {
        (**self).distance_km(from, to)
    }

    fn matrix_for(&self, origins: &[GeoPoint], destinations: &[GeoPoint]) -> Vec<Vec<f64>> {
        (**self).matrix_for(origins, destinations)
    }
}

/// Patient-to-facility distances, indexed `[patient][facility]`.
pub fn distance_matrix<D>(patients: &[Patient], facilities: &[Facility], distance: &D) -> Vec<Vec<f64>>
where
    D: DistanceProvider + ?Sized,
{
    let origins: Vec<GeoPoint> = patients.iter().map(|p| p.location).collect();
    let destinations: Vec<GeoPoint> = facilities.iter().map(|f| f.location).collect();
    distance.matrix_for(&origins, &destinations)
}
