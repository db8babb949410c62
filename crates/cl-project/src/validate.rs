//! Configuration validation logic.

use crate::schema::{HeatingDef, LoopConfig};

pub const LATEST_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing field: {field} ({reason})")]
    Missing { field: String, reason: String },

    #[error("Conflicting fields: {fields} ({reason})")]
    Conflict { fields: String, reason: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: &str, value: f64, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn positive(field: &str, value: f64) -> Result<(), ValidationError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(invalid(field, value, "must be positive and finite"));
    }
    Ok(())
}

fn non_negative(field: &str, value: f64) -> Result<(), ValidationError> {
    if !(value.is_finite() && value >= 0.0) {
        return Err(invalid(field, value, "must be non-negative and finite"));
    }
    Ok(())
}

pub fn validate_config(config: &LoopConfig) -> Result<(), ValidationError> {
    if config.version == 0 || config.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: config.version,
        });
    }

    positive("total_time", config.total_time)?;
    positive("tau", config.tau)?;
    positive("loop_length_megameters", config.loop_length_megameters)?;
    positive("rka_error", config.rka_error)?;
    if !config.use_spitzer_conductivity {
        positive("saturation_limit", config.saturation_limit)?;
    }
    non_negative("c1_cond0", config.c1_cond0)?;
    non_negative("c1_rad0", config.c1_rad0)?;
    non_negative("helium_to_hydrogen_ratio", config.helium_to_hydrogen_ratio)?;

    if config.max_steps == Some(0) {
        return Err(ValidationError::InvalidValue {
            field: "max_steps".to_string(),
            value: "0".to_string(),
            reason: "must be positive".to_string(),
        });
    }

    if config.output_filename.trim().is_empty() {
        return Err(ValidationError::Missing {
            field: "output_filename".to_string(),
            reason: "results need somewhere to go".to_string(),
        });
    }

    if !config.use_power_law_radiative_losses {
        match &config.radiation {
            Some(r) if !r.table_path.trim().is_empty() => {}
            _ => {
                return Err(ValidationError::Missing {
                    field: "radiation.table_path".to_string(),
                    reason: "required when use_power_law_radiative_losses is false".to_string(),
                });
            }
        }
    }

    validate_heating(&config.heating)?;

    if config.calculate_dem {
        let dem = config.dem_bins();
        if !(dem.log_temperature_min.is_finite() && dem.log_temperature_max.is_finite()) {
            return Err(invalid(
                "dem.log_temperature_min",
                dem.log_temperature_min,
                "bin edges must be finite",
            ));
        }
        positive("dem.log_temperature_step", dem.log_temperature_step)?;
        if dem.log_temperature_max <= dem.log_temperature_min {
            return Err(invalid(
                "dem.log_temperature_max",
                dem.log_temperature_max,
                "must exceed dem.log_temperature_min",
            ));
        }
    }

    Ok(())
}

fn validate_heating(heating: &HeatingDef) -> Result<(), ValidationError> {
    non_negative("heating.background", heating.background)?;

    if heating.partition.is_some() && heating.species.is_some() {
        return Err(ValidationError::Conflict {
            fields: "heating.partition, heating.species".to_string(),
            reason: "give one or the other".to_string(),
        });
    }
    if let Some(p) = heating.partition {
        if !(0.0..=1.0).contains(&p) {
            return Err(invalid("heating.partition", p, "must lie in [0, 1]"));
        }
    }

    for (i, event) in heating.events.iter().enumerate() {
        let field = |name: &str| format!("heating.events[{i}].{name}");
        if !(event.start.is_finite() && event.end.is_finite()) {
            return Err(invalid(&field("start"), event.start, "must be finite"));
        }
        if event.end <= event.start {
            return Err(invalid(&field("end"), event.end, "must be after start"));
        }
        non_negative(&field("magnitude"), event.magnitude)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{HeatingEventDef, PulseShapeDef, RadiationDef};

    fn base() -> LoopConfig {
        LoopConfig::quiescent(40.0, 0.01, "results/loop.txt")
    }

    #[test]
    fn quiescent_config_is_valid() {
        assert!(validate_config(&base()).is_ok());
    }

    #[test]
    fn rejects_non_positive_tau() {
        let config = LoopConfig { tau: 0.0, ..base() };
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("tau"));
    }

    #[test]
    fn rejects_future_version() {
        let config = LoopConfig {
            version: LATEST_VERSION + 1,
            ..base()
        };
        assert!(matches!(
            validate_config(&config),
            Err(ValidationError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn saturation_limit_only_checked_when_flux_limited() {
        let spitzer = LoopConfig {
            saturation_limit: -1.0,
            ..base()
        };
        assert!(validate_config(&spitzer).is_ok());
        let limited = LoopConfig {
            use_spitzer_conductivity: false,
            ..spitzer
        };
        assert!(validate_config(&limited).is_err());
    }

    #[test]
    fn table_radiation_needs_a_path() {
        let mut config = LoopConfig {
            use_power_law_radiative_losses: false,
            ..base()
        };
        assert!(matches!(
            validate_config(&config),
            Err(ValidationError::Missing { .. })
        ));
        config.radiation = Some(RadiationDef {
            table_path: "rad.txt".to_string(),
        });
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn heating_checks() {
        let mut config = base();
        config.heating.partition = Some(1.5);
        assert!(validate_config(&config).is_err());

        let mut config = base();
        config.heating.partition = Some(0.5);
        config.heating.species = Some(crate::schema::HeatedSpeciesDef::Ion);
        assert!(matches!(
            validate_config(&config),
            Err(ValidationError::Conflict { .. })
        ));

        let mut config = base();
        config.heating.events.push(HeatingEventDef {
            shape: PulseShapeDef::Triangle,
            start: 100.0,
            end: 50.0,
            magnitude: 0.1,
        });
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("heating.events[0].end"));
    }

    #[test]
    fn dem_bins_checked_only_when_enabled() {
        let mut config = base();
        config.dem = Some(crate::schema::DemDef {
            log_temperature_min: 7.0,
            log_temperature_max: 5.0,
            log_temperature_step: 0.1,
        });
        assert!(validate_config(&config).is_ok());
        config.calculate_dem = true;
        assert!(validate_config(&config).is_err());
    }
}
