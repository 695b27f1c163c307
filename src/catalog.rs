//! Static capability table for known provider device types
//!
//! Maps a provider type string to the command names it accepts and its typed
//! status fields. Immutable configuration data; types missing from this
//! table still register, just with empty capability and status sets.

/// Semantic type of a status field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// true/false
    Boolean,
    /// Numeric value
    Number,
    /// Free-form string
    Text,
}

/// Capabilities of one provider device type
#[derive(Debug, Clone, Copy)]
pub struct TypeDescriptor {
    /// Command names this type accepts
    pub commands: &'static [&'static str],
    /// Observable status fields and their semantic types
    pub status_fields: &'static [(&'static str, FieldType)],
}

/// Empty descriptor used for unknown types (graceful degradation)
pub const UNKNOWN: TypeDescriptor = TypeDescriptor {
    commands: &[],
    status_fields: &[],
};

/// Look up the descriptor for a provider type string
#[must_use]
pub fn lookup(device_type: &str) -> Option<TypeDescriptor> {
    use FieldType::{Boolean, Number, Text};

    let descriptor = match device_type {
        "Bot" => TypeDescriptor {
            commands: &["turnOn", "turnOff", "press"],
            status_fields: &[
                ("power", Text),
                ("battery", Number),
                ("deviceMode", Text),
            ],
        },
        "Curtain" | "Curtain3" => TypeDescriptor {
            commands: &["turnOn", "turnOff", "setPosition", "pause"],
            status_fields: &[
                ("slidePosition", Number),
                ("moving", Boolean),
                ("battery", Number),
                ("calibrate", Boolean),
            ],
        },
        "Blind Tilt" => TypeDescriptor {
            commands: &["setPosition"],
            status_fields: &[
                ("slidePosition", Number),
                ("direction", Text),
                ("moving", Boolean),
                ("battery", Number),
            ],
        },
        "Plug" => TypeDescriptor {
            commands: &["turnOn", "turnOff"],
            status_fields: &[("power", Text)],
        },
        "Plug Mini (US)" | "Plug Mini (JP)" => TypeDescriptor {
            commands: &["turnOn", "turnOff"],
            status_fields: &[
                ("power", Text),
                ("voltage", Number),
                ("weight", Number),
                ("electricCurrent", Number),
            ],
        },
        "Meter" | "MeterPlus" => TypeDescriptor {
            commands: &[],
            status_fields: &[
                ("temperature", Number),
                ("humidity", Number),
                ("battery", Number),
            ],
        },
        "Hub 2" => TypeDescriptor {
            commands: &[],
            status_fields: &[
                ("temperature", Number),
                ("humidity", Number),
                ("lightLevel", Number),
            ],
        },
        "Humidifier" => TypeDescriptor {
            commands: &["turnOn", "turnOff"],
            status_fields: &[
                ("power", Text),
                ("humidity", Number),
                ("temperature", Number),
                ("nebulizationEfficiency", Number),
                ("auto", Boolean),
                ("childLock", Boolean),
            ],
        },
        "Smart Lock" => TypeDescriptor {
            commands: &["lock", "unlock"],
            status_fields: &[
                ("lockState", Text),
                ("doorState", Text),
                ("battery", Number),
                ("calibrate", Boolean),
            ],
        },
        "Color Bulb" => TypeDescriptor {
            commands: &[
                "turnOn",
                "turnOff",
                "setBrightness",
                "setColor",
                "setColorTemperature",
            ],
            status_fields: &[
                ("power", Text),
                ("brightness", Number),
                ("color", Text),
                ("colorTemperature", Number),
            ],
        },
        "Strip Light" => TypeDescriptor {
            commands: &["turnOn", "turnOff", "setBrightness", "setColor"],
            status_fields: &[
                ("power", Text),
                ("brightness", Number),
                ("color", Text),
            ],
        },
        "Motion Sensor" => TypeDescriptor {
            commands: &[],
            status_fields: &[
                ("moveDetected", Boolean),
                ("brightness", Text),
                ("battery", Number),
            ],
        },
        "Contact Sensor" => TypeDescriptor {
            commands: &[],
            status_fields: &[
                ("openState", Text),
                ("moveDetected", Boolean),
                ("brightness", Text),
                ("battery", Number),
            ],
        },
        _ => return None,
    };

    Some(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_type_has_commands_and_fields() {
        let bot = lookup("Bot").unwrap();
        assert!(bot.commands.contains(&"press"));
        assert!(bot
            .status_fields
            .iter()
            .any(|(name, ty)| *name == "battery" && *ty == FieldType::Number));
    }

    #[test]
    fn curtain_aliases_share_descriptor() {
        let c = lookup("Curtain").unwrap();
        let c3 = lookup("Curtain3").unwrap();
        assert_eq!(c.commands, c3.commands);
    }

    #[test]
    fn sensors_have_no_commands() {
        assert!(lookup("Meter").unwrap().commands.is_empty());
        assert!(lookup("Motion Sensor").unwrap().commands.is_empty());
        assert!(lookup("Contact Sensor").unwrap().commands.is_empty());
    }

    #[test]
    fn unknown_type_is_none() {
        assert!(lookup("Quantum Kettle").is_none());
        assert_eq!(UNKNOWN.commands.len(), 0);
        assert_eq!(UNKNOWN.status_fields.len(), 0);
    }
}
