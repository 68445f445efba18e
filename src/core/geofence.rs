//! Great-circle geofence evaluation. Pure math, no side effects: called
//! once per check-in/out attempt and again for the `locate` preview.

use serde::Serialize;

/// Spherical Earth radius in meters. Sufficient at job-site scales
/// (sub-kilometer); no ellipsoidal correction.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

pub const FEET_TO_METERS: f64 = 0.3048;

/// Default geofence radius when an assignment does not specify one
/// (250 ft ≈ 76.2 m).
pub const DEFAULT_GEOFENCE_RADIUS_FT: f64 = 250.0;

#[derive(Debug, Clone, Copy)]
pub struct DevicePosition {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_m: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
pub struct SitePosition {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_m: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct GeofenceVerdict {
    pub distance_m: f64,
    pub radius_m: f64,
    /// Inclusive comparison: a device exactly at the radius is within.
    pub within_geofence: bool,
    /// Reported device accuracy, surfaced for display and audit only.
    /// It never widens or shrinks the verdict.
    pub accuracy_m: Option<f64>,
}

/// Haversine distance in meters between two lat/lon points.
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

pub fn evaluate(device: &DevicePosition, site: &SitePosition) -> GeofenceVerdict {
    let distance_m = haversine_m(device.latitude, device.longitude, site.latitude, site.longitude);
    GeofenceVerdict {
        distance_m,
        radius_m: site.radius_m,
        within_geofence: distance_m <= site.radius_m,
        accuracy_m: device.accuracy_m,
    }
}

pub fn feet_to_meters(ft: f64) -> f64 {
    ft * FEET_TO_METERS
}

pub fn meters_to_feet(m: f64) -> f64 {
    m / FEET_TO_METERS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(lat: f64, lon: f64) -> DevicePosition {
        DevicePosition {
            latitude: lat,
            longitude: lon,
            accuracy_m: None,
        }
    }

    #[test]
    fn same_point_has_zero_distance() {
        let d = haversine_m(36.1627, -86.7816, 36.1627, -86.7816);
        assert!(d.abs() < 1e-9);
    }

    #[test]
    fn latitude_separation_matches_expected_geodesic() {
        // Two points 0.00069° of latitude apart are ≈ 76.7 m apart.
        let d = haversine_m(36.1627, -86.7816, 36.16339, -86.7816);
        assert!((d - 76.7).abs() < 0.5, "got {}", d);
    }

    #[test]
    fn default_radius_is_76_2_meters() {
        assert!((feet_to_meters(DEFAULT_GEOFENCE_RADIUS_FT) - 76.2).abs() < 1e-9);
    }

    #[test]
    fn boundary_is_inclusive() {
        let dev = device(36.1627 + 0.00069, -86.7816);
        let d = haversine_m(dev.latitude, dev.longitude, 36.1627, -86.7816);

        let at_radius = evaluate(
            &dev,
            &SitePosition {
                latitude: 36.1627,
                longitude: -86.7816,
                radius_m: d,
            },
        );
        assert!(at_radius.within_geofence);

        // One meter beyond the radius is outside.
        let beyond = evaluate(
            &dev,
            &SitePosition {
                latitude: 36.1627,
                longitude: -86.7816,
                radius_m: d - 1.0,
            },
        );
        assert!(!beyond.within_geofence);
    }

    #[test]
    fn accuracy_is_surfaced_but_ignored_by_the_verdict() {
        let site = SitePosition {
            latitude: 36.1627,
            longitude: -86.7816,
            radius_m: 76.2,
        };
        // ~120 m north of the site; even a huge reported accuracy does not
        // pull the device inside the fence.
        let dev = DevicePosition {
            latitude: 36.1627 + 0.00108,
            longitude: -86.7816,
            accuracy_m: Some(500.0),
        };
        let v = evaluate(&dev, &site);
        assert!(!v.within_geofence);
        assert!(v.distance_m > 76.2);
        assert_eq!(v.accuracy_m, Some(500.0));
    }

    #[test]
    fn fifty_meters_inside_default_radius() {
        let site = SitePosition {
            latitude: 36.1627,
            longitude: -86.7816,
            radius_m: feet_to_meters(DEFAULT_GEOFENCE_RADIUS_FT),
        };
        let v = evaluate(&device(36.1627 + 0.00045, -86.7816), &site);
        assert!(v.within_geofence);
        assert!((v.distance_m - 50.0).abs() < 1.0, "got {}", v.distance_m);
    }
}
