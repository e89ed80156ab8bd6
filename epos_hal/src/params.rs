//! Parameter translation.
//!
//! Converts the configuration subsections of a motor entry into typed,
//! device-native parameter groups and writes them to a node.
//!
//! All preconditions (variant conflicts, unit conversion ranges) are checked
//! in the `from_config` constructors, so a built [`AxisSpec`] can be applied
//! without further configuration errors. The `apply` methods only return
//! vendor errors and report whether anything was written.
//!
//! # Units
//!
//! | Field | Config | Device |
//! |-------|--------|--------|
//! | motor currents | A | mA (×1000) |
//! | thermal time constant | s | 100 ms (×10) |
//! | window time | s | ms (×1000) |
//!
//! Scaled values are rounded to the nearest device unit.

use crate::identity::{AxisIdentity, resolve_identity};
use epos_common::config::ConfigError;
use epos_common::hal::config::{
    AxisConfig, CurrentRegulatorConfig, MotorConfig, PositionProfileConfig,
    PositionRegulatorConfig, SafetyConfig, SensorConfig, VelocityProfileConfig,
    VelocityRegulatorConfig, WindowConfig,
};
use epos_common::hal::consts::{
    DECISECONDS_PER_SECOND, MILLIAMPS_PER_AMP, MILLISECONDS_PER_SECOND,
};
use epos_common::hal::driver::EposNode;
use epos_common::hal::types::{
    DcMotorParameter, EcMotorParameter, FeedForward, HallSensorParameter, IncEncoderParameter,
    MotorType, PiGain, PidGain, PositionProfile, SensorType, SsiAbsEncoderParameter,
    VelocityProfile, VendorResult, Window,
};

/// Scale an SI value into a 16-bit device unit.
fn scale_to_u16(field: &str, value: f64, factor: f64) -> Result<u16, ConfigError> {
    let scaled = (value * factor).round();
    if !scaled.is_finite() || scaled < 0.0 || scaled > f64::from(u16::MAX) {
        return Err(ConfigError::invalid_field(
            field,
            format!("{value} does not fit the device range after scaling by {factor}"),
        ));
    }
    Ok(scaled as u16)
}

/// Amperes to milliamperes.
pub fn amps_to_milliamps(field: &str, amps: f64) -> Result<u16, ConfigError> {
    scale_to_u16(field, amps, MILLIAMPS_PER_AMP)
}

/// Seconds to 100 ms units.
pub fn seconds_to_deciseconds(field: &str, seconds: f64) -> Result<u16, ConfigError> {
    scale_to_u16(field, seconds, DECISECONDS_PER_SECOND)
}

/// Seconds to milliseconds.
pub fn seconds_to_milliseconds(field: &str, seconds: f64) -> Result<u16, ConfigError> {
    scale_to_u16(field, seconds, MILLISECONDS_PER_SECOND)
}

/// Write `value` if present. Returns whether a call was issued.
fn apply_optional<T>(
    value: Option<&T>,
    write: impl FnOnce(&T) -> VendorResult<()>,
) -> VendorResult<bool> {
    match value {
        Some(v) => write(v).map(|()| true),
        None => Ok(false),
    }
}

// ─── Motor ──────────────────────────────────────────────────────────

/// Electrical model of the motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorParameters {
    /// Brushed DC motor.
    Dc(DcMotorParameter),
    /// Brushless EC motor.
    Ec(EcMotorParameter),
}

/// Motor type plus optional electrical model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorModel {
    /// Motor type, always written.
    pub motor_type: MotorType,
    /// Electrical model; vendor defaults are kept when absent.
    pub parameters: Option<MotorParameters>,
}

impl MotorModel {
    /// Build from the `motor` section.
    pub fn from_config(config: &MotorConfig) -> Result<Self, ConfigError> {
        let motor_type = MotorType::from_code(config.motor_type).ok_or_else(|| {
            ConfigError::invalid_field(
                "motor.type",
                format!("unknown motor type {}", config.motor_type),
            )
        })?;

        let parameters = match (&config.dc_motor, &config.ec_motor) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::ConflictingSections {
                    section: "motor",
                    found: "dc_motor, ec_motor".to_string(),
                });
            }
            (Some(dc), None) => Some(MotorParameters::Dc(DcMotorParameter {
                nominal_current: amps_to_milliamps(
                    "motor.dc_motor.nominal_current",
                    dc.nominal_current,
                )?,
                max_output_current: amps_to_milliamps(
                    "motor.dc_motor.max_output_current",
                    dc.max_output_current,
                )?,
                thermal_time_constant: seconds_to_deciseconds(
                    "motor.dc_motor.thermal_time_constant",
                    dc.thermal_time_constant,
                )?,
            })),
            (None, Some(ec)) => Some(MotorParameters::Ec(EcMotorParameter {
                nominal_current: amps_to_milliamps(
                    "motor.ec_motor.nominal_current",
                    ec.nominal_current,
                )?,
                max_output_current: amps_to_milliamps(
                    "motor.ec_motor.max_output_current",
                    ec.max_output_current,
                )?,
                thermal_time_constant: seconds_to_deciseconds(
                    "motor.ec_motor.thermal_time_constant",
                    ec.thermal_time_constant,
                )?,
                pole_pairs: ec.number_of_pole_pairs,
            })),
            (None, None) => None,
        };

        Ok(Self {
            motor_type,
            parameters,
        })
    }

    /// Write motor type, then the electrical model if present.
    pub fn apply(&self, node: &mut dyn EposNode) -> VendorResult<()> {
        node.set_motor_type(self.motor_type)?;
        match &self.parameters {
            Some(MotorParameters::Dc(p)) => node.set_dc_motor_parameter(p),
            Some(MotorParameters::Ec(p)) => node.set_ec_motor_parameter(p),
            None => Ok(()),
        }
    }
}

// ─── Sensor ─────────────────────────────────────────────────────────

/// Sensor model variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorParameters {
    /// Incremental encoder.
    IncrementalEncoder(IncEncoderParameter),
    /// Hall sensors.
    HallSensor(HallSensorParameter),
    /// SSI absolute encoder.
    SsiAbsoluteEncoder(SsiAbsEncoderParameter),
}

/// Sensor type plus optional sensor model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorModel {
    /// Sensor type, always written.
    pub sensor_type: SensorType,
    /// Sensor model; vendor defaults are kept when absent.
    pub parameters: Option<SensorParameters>,
}

impl SensorModel {
    /// Build from the `sensor` section. At most one variant may be present.
    pub fn from_config(config: &SensorConfig) -> Result<Self, ConfigError> {
        let sensor_type = SensorType::from_code(config.sensor_type).ok_or_else(|| {
            ConfigError::invalid_field(
                "sensor.type",
                format!("unknown sensor type {}", config.sensor_type),
            )
        })?;

        let mut variants = Vec::new();
        if let Some(enc) = &config.incremental_encoder {
            variants.push((
                "incremental_encoder",
                SensorParameters::IncrementalEncoder(IncEncoderParameter {
                    resolution: enc.resolution,
                    inverted_polarity: enc.inverted_polarity,
                }),
            ));
        }
        if let Some(hall) = &config.hall_sensor {
            variants.push((
                "hall_sensor",
                SensorParameters::HallSensor(HallSensorParameter {
                    inverted_polarity: hall.inverted_polarity,
                }),
            ));
        }
        if let Some(ssi) = &config.ssi_absolute_encoder {
            variants.push((
                "ssi_absolute_encoder",
                SensorParameters::SsiAbsoluteEncoder(SsiAbsEncoderParameter {
                    data_rate: ssi.data_rate,
                    multiturn_bits: ssi.number_of_multiturn_bits,
                    singleturn_bits: ssi.number_of_singleturn_bits,
                    inverted_polarity: ssi.inverted_polarity,
                }),
            ));
        }

        if variants.len() > 1 {
            let found: Vec<&str> = variants.iter().map(|(name, _)| *name).collect();
            return Err(ConfigError::ConflictingSections {
                section: "sensor",
                found: found.join(", "),
            });
        }

        Ok(Self {
            sensor_type,
            parameters: variants.pop().map(|(_, p)| p),
        })
    }

    /// Write sensor type, then the sensor model if present.
    pub fn apply(&self, node: &mut dyn EposNode) -> VendorResult<()> {
        node.set_sensor_type(self.sensor_type)?;
        match &self.parameters {
            Some(SensorParameters::IncrementalEncoder(p)) => node.set_inc_encoder_parameter(p),
            Some(SensorParameters::HallSensor(p)) => node.set_hall_sensor_parameter(p),
            Some(SensorParameters::SsiAbsoluteEncoder(p)) => node.set_ssi_abs_encoder_parameter(p),
            None => Ok(()),
        }
    }
}

// ─── Safety ─────────────────────────────────────────────────────────

/// Safety limits; absent fields keep vendor defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SafetyLimits {
    /// Maximum following error.
    pub max_following_error: Option<u32>,
    /// Maximum profile velocity.
    pub max_profile_velocity: Option<u32>,
    /// Maximum acceleration.
    pub max_acceleration: Option<u32>,
}

impl SafetyLimits {
    /// Build from the `safety` section.
    pub fn from_config(config: &SafetyConfig) -> Self {
        Self {
            max_following_error: config.max_following_error,
            max_profile_velocity: config.max_profile_velocity,
            max_acceleration: config.max_acceleration,
        }
    }

    /// Write each present limit.
    pub fn apply(&self, node: &mut dyn EposNode) -> VendorResult<bool> {
        let a = apply_optional(self.max_following_error.as_ref(), |v| {
            node.set_max_following_error(*v)
        })?;
        let b = apply_optional(self.max_profile_velocity.as_ref(), |v| {
            node.set_max_profile_velocity(*v)
        })?;
        let c = apply_optional(self.max_acceleration.as_ref(), |v| {
            node.set_max_acceleration(*v)
        })?;
        Ok(a || b || c)
    }
}

// ─── Regulators ─────────────────────────────────────────────────────

/// A regulator stage: optional gains and optional feed-forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Regulator<G> {
    /// Gains.
    pub gain: Option<G>,
    /// Feed-forward factors.
    pub feed_forward: Option<FeedForward>,
}

impl<G> Regulator<G> {
    /// Write whichever parts are present, gains first.
    fn apply_with(
        &self,
        node: &mut dyn EposNode,
        write_gain: impl FnOnce(&mut dyn EposNode, &G) -> VendorResult<()>,
        write_feed_forward: impl FnOnce(&mut dyn EposNode, &FeedForward) -> VendorResult<()>,
    ) -> VendorResult<bool> {
        let gain = apply_optional(self.gain.as_ref(), |g| write_gain(&mut *node, g))?;
        let ff = apply_optional(self.feed_forward.as_ref(), |f| {
            write_feed_forward(&mut *node, f)
        })?;
        Ok(gain || ff)
    }
}

impl Regulator<PidGain> {
    /// Build from the `position_regulator` section.
    pub fn from_position_config(config: &PositionRegulatorConfig) -> Self {
        Self {
            gain: config.gain.map(|g| PidGain {
                p: g.p,
                i: g.i,
                d: g.d,
            }),
            feed_forward: config.feed_forward.map(|f| FeedForward {
                velocity: f.velocity,
                acceleration: f.acceleration,
            }),
        }
    }

    /// Write position regulator gains and feed-forward.
    pub fn apply(&self, node: &mut dyn EposNode) -> VendorResult<bool> {
        self.apply_with(
            node,
            |n, g| n.set_position_regulator_gain(g),
            |n, f| n.set_position_regulator_feed_forward(f),
        )
    }
}

impl Regulator<PiGain> {
    /// Build from the `velocity_regulator` section.
    pub fn from_velocity_config(config: &VelocityRegulatorConfig) -> Self {
        Self {
            gain: config.gain.map(|g| PiGain { p: g.p, i: g.i }),
            feed_forward: config.feed_forward.map(|f| FeedForward {
                velocity: f.velocity,
                acceleration: f.acceleration,
            }),
        }
    }

    /// Build from the `current_regulator` section (no feed-forward stage).
    pub fn from_current_config(config: &CurrentRegulatorConfig) -> Self {
        Self {
            gain: config.gain.map(|g| PiGain { p: g.p, i: g.i }),
            feed_forward: None,
        }
    }

    /// Write velocity regulator gains and feed-forward.
    ///
    /// Writing the same values again has no further effect on the node.
    pub fn apply_velocity(&self, node: &mut dyn EposNode) -> VendorResult<bool> {
        self.apply_with(
            node,
            |n, g| n.set_velocity_regulator_gain(g),
            |n, f| n.set_velocity_regulator_feed_forward(f),
        )
    }

    /// Write current regulator gains.
    pub fn apply_current(&self, node: &mut dyn EposNode) -> VendorResult<bool> {
        apply_optional(self.gain.as_ref(), |g| node.set_current_regulator_gain(g))
    }
}

// ─── Profiles ───────────────────────────────────────────────────────

fn window_from_config(field: &str, config: &WindowConfig) -> Result<Window, ConfigError> {
    Ok(Window {
        window: config.window,
        time_ms: seconds_to_milliseconds(field, config.time)?,
    })
}

/// Position profile plus optional position window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionProfileSettings {
    /// Velocity, acceleration and deceleration.
    pub profile: PositionProfile,
    /// Position window.
    pub window: Option<Window>,
}

impl PositionProfileSettings {
    /// Build from the `position_profile` section.
    pub fn from_config(config: &PositionProfileConfig) -> Result<Self, ConfigError> {
        let window = config
            .window
            .as_ref()
            .map(|w| window_from_config("position_profile.window.time", w))
            .transpose()?;
        Ok(Self {
            profile: PositionProfile {
                velocity: config.velocity,
                acceleration: config.acceleration,
                deceleration: config.deceleration,
            },
            window,
        })
    }

    /// Write the profile, then enable the window if present.
    pub fn apply(&self, node: &mut dyn EposNode) -> VendorResult<()> {
        node.set_position_profile(&self.profile)?;
        apply_optional(self.window.as_ref(), |w| node.enable_position_window(w))?;
        Ok(())
    }
}

/// Velocity profile plus optional velocity window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VelocityProfileSettings {
    /// Acceleration and deceleration.
    pub profile: VelocityProfile,
    /// Velocity window.
    pub window: Option<Window>,
}

impl VelocityProfileSettings {
    /// Build from the `velocity_profile` section.
    pub fn from_config(config: &VelocityProfileConfig) -> Result<Self, ConfigError> {
        let window = config
            .window
            .as_ref()
            .map(|w| window_from_config("velocity_profile.window.time", w))
            .transpose()?;
        Ok(Self {
            profile: VelocityProfile {
                acceleration: config.acceleration,
                deceleration: config.deceleration,
            },
            window,
        })
    }

    /// Write the profile, then enable the window if present.
    pub fn apply(&self, node: &mut dyn EposNode) -> VendorResult<()> {
        node.set_velocity_profile(&self.profile)?;
        apply_optional(self.window.as_ref(), |w| node.enable_velocity_window(w))?;
        Ok(())
    }
}

// ─── Axis ───────────────────────────────────────────────────────────

/// Fully resolved configuration of one axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisSpec {
    /// Name, serial number and operation mode.
    pub identity: AxisIdentity,
    /// Motor model.
    pub motor: MotorModel,
    /// Sensor model.
    pub sensor: SensorModel,
    /// Safety limits.
    pub safety: Option<SafetyLimits>,
    /// Position regulator.
    pub position_regulator: Option<Regulator<PidGain>>,
    /// Velocity regulator.
    pub velocity_regulator: Option<Regulator<PiGain>>,
    /// Current regulator.
    pub current_regulator: Option<Regulator<PiGain>>,
    /// Position profile.
    pub position_profile: Option<PositionProfileSettings>,
    /// Velocity profile.
    pub velocity_profile: Option<VelocityProfileSettings>,
    /// Clear pending faults before enabling.
    pub clear_faults: bool,
    /// Initial cyclic set-point.
    pub setpoint: i32,
}

impl AxisSpec {
    /// Resolve a motor entry. Every configuration check happens here.
    pub fn from_config(config: &AxisConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            identity: resolve_identity(config)?,
            motor: MotorModel::from_config(&config.motor)?,
            sensor: SensorModel::from_config(&config.sensor)?,
            safety: config.safety.as_ref().map(SafetyLimits::from_config),
            position_regulator: config
                .position_regulator
                .as_ref()
                .map(Regulator::<PidGain>::from_position_config),
            velocity_regulator: config
                .velocity_regulator
                .as_ref()
                .map(Regulator::<PiGain>::from_velocity_config),
            current_regulator: config
                .current_regulator
                .as_ref()
                .map(Regulator::<PiGain>::from_current_config),
            position_profile: config
                .position_profile
                .as_ref()
                .map(PositionProfileSettings::from_config)
                .transpose()?,
            velocity_profile: config
                .velocity_profile
                .as_ref()
                .map(VelocityProfileSettings::from_config)
                .transpose()?,
            clear_faults: config.clear_faults,
            setpoint: config.setpoint,
        })
    }
}
