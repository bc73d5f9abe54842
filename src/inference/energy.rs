//! Impact energy and its equivalent seismic magnitude.

use crate::error::PredictionError;

const LOG_ENERGY_OFFSET: f64 = 4.8;
const LOG_ENERGY_SLOPE: f64 = 1.5;

/// Kinetic energy in joules of a body of `mass_kg` moving at `velocity_ms`.
pub fn kinetic_energy(mass_kg: f64, velocity_ms: f64) -> f64 {
    0.5 * mass_kg * velocity_ms * velocity_ms
}

/// Magnitude releasing `energy_joules`, from `log10(E) = 1.5 M + 4.8`.
pub fn energy_to_magnitude(energy_joules: f64) -> Result<f64, PredictionError> {
    // ---
    if !(energy_joules > 0.0) || !energy_joules.is_finite() {
        return Err(PredictionError::Domain(format!(
            "Energy must be positive, got {energy_joules}"
        )));
    }
    Ok((energy_joules.log10() - LOG_ENERGY_OFFSET) / LOG_ENERGY_SLOPE)
}

/// Energy released by an event of `magnitude`.
pub fn magnitude_to_energy(magnitude: f64) -> f64 {
    10f64.powf(LOG_ENERGY_SLOPE * magnitude + LOG_ENERGY_OFFSET)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_kinetic_energy() {
        // ---
        let energy = kinetic_energy(1.4e7, 18_000.0);
        assert!((energy - 2.268e15).abs() / 2.268e15 < 1e-12);
    }

    #[test]
    fn test_magnitude_round_trip() {
        // ---
        let mut m = -2.0;
        while m <= 10.0 {
            let back = energy_to_magnitude(magnitude_to_energy(m)).unwrap();
            assert!((back - m).abs() < 1e-9, "m={m} came back as {back}");
            m += 0.25;
        }
    }

    #[test]
    fn test_non_positive_energy_is_domain_error() {
        // ---
        assert!(matches!(
            energy_to_magnitude(0.0),
            Err(PredictionError::Domain(_))
        ));
        assert!(matches!(
            energy_to_magnitude(-5.0),
            Err(PredictionError::Domain(_))
        ));
        assert!(energy_to_magnitude(f64::NAN).is_err());
    }
}
