//! Tool metadata shown to the language model

use serde::Serialize;
use serde_json::{json, Value};

use super::ToolName;

/// Name, description, JSON-schema parameters and output schema of one tool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
    /// Either `{"ok": <record>}` or `{"error": {"message": ...}}`
    pub output: Value,
}

fn serial_number_property(subject: &str) -> Value {
    json!({
        "type": "integer",
        "minimum": 0,
        "description": format!(
            "The serial number of the inverter to query. If not provided or 0, returns the {} for the default inverter.",
            subject
        )
    })
}

fn device_only(subject: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "inverter_serial_number": serial_number_property(subject)
        },
        "required": []
    })
}

fn integer(unit: &str) -> Value {
    json!({"type": "integer", "description": unit})
}

fn power_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "power": {"type": "integer", "minimum": 0, "description": "W"},
            "direction": {
                "type": "string",
                "enum": ["flowing into the battery", "flowing from the battery"]
            }
        },
        "required": ["power", "direction"]
    })
}

fn object(properties: Value) -> Value {
    let required: Vec<Value> = properties
        .as_object()
        .map(|fields| fields.keys().cloned().map(Value::String).collect())
        .unwrap_or_default();
    json!({"type": "object", "properties": properties, "required": required})
}

/// Schema of the JSON record a successful call returns
pub fn record_schema(tool: ToolName) -> Value {
    match tool {
        ToolName::BatteryState => object(json!({
            "bmsSoc": {"type": "integer", "minimum": 0, "maximum": 100, "description": "%"},
            "bmsVolt": {"type": "number", "description": "V"},
            "voltage": {"type": "number", "description": "V"},
            "isCharging": {"type": "boolean"},
            "temp": {"type": "number", "description": "Celsius"},
            "power": power_schema()
        })),
        ToolName::GridState => object(json!({
            "power": integer("W"),
            "isUp": {"type": "boolean"}
        })),
        ToolName::InputState => object(json!({
            "power": integer("W"),
            "peakPower": integer("W")
        })),
        ToolName::LoadState => object(json!({
            "power": integer("W")
        })),
        ToolName::InverterSettings => object(json!({
            "ratedPower": integer("W"),
            "loadPower": integer("W"),
            "batteryPower": power_schema(),
            "inputPower": integer("W"),
            "gridPower": integer("W"),
            "batteryMinimumSoCLimit": integer("%"),
            "powerEssentialOnly": {"type": "boolean"},
            "gridCharge": {"type": "boolean"}
        })),
        ToolName::InverterUpdate => object(json!({
            "applied": {
                "type": "object",
                "description": "The settings that were written",
                "properties": {
                    "minimumBatterySoc": {"type": "integer", "minimum": 0, "maximum": 100},
                    "essentialOnly": {"type": "boolean"},
                    "gridCharge": {"type": "boolean"}
                }
            }
        })),
    }
}

fn output_schema(tool: ToolName) -> Value {
    json!({
        "oneOf": [
            object(json!({"ok": record_schema(tool)})),
            object(json!({"error": object(json!({"message": {"type": "string"}}))}))
        ]
    })
}

pub fn definition(tool: ToolName) -> ToolDefinition {
    match tool {
        ToolName::BatteryState => ToolDefinition {
            name: tool.as_str(),
            description: "Gets the state of a battery including the battery state of charge (bmsSoc, %), \
                temperature (temp, Celsius), voltage according to the BMS (bmsVolt) and the inverter (voltage), \
                whether the battery is charging (isCharging) and the power flowing into or from the battery \
                (power, in Watts, with its direction).",
            parameters: device_only("battery state"),
            output: output_schema(tool),
        },
        ToolName::GridState => ToolDefinition {
            name: tool.as_str(),
            description: "Retrieves the current grid state: the power exchanged with the electricity grid \
                (power, Watts) and whether the grid is up (isUp).",
            parameters: device_only("grid state"),
            output: output_schema(tool),
        },
        ToolName::InputState => ToolDefinition {
            name: tool.as_str(),
            description: "Retrieves the current input state (e.g. solar panels): the power being produced \
                (power, Watts) and the peak power the input can produce (peakPower, Watts).",
            parameters: device_only("input state"),
            output: output_schema(tool),
        },
        ToolName::LoadState => ToolDefinition {
            name: tool.as_str(),
            description: "Retrieves the load connected to the inverter: the power being consumed \
                (power, Watts), e.g. by the home.",
            parameters: device_only("load state"),
            output: output_schema(tool),
        },
        ToolName::InverterSettings => ToolDefinition {
            name: tool.as_str(),
            description: "Retrieves the inverter settings and current power flows: rated maximum power \
                (ratedPower), power supplied to the load (loadPower), battery power with direction \
                (batteryPower), input power (inputPower), grid power (gridPower), the minimum battery state \
                of charge for discharge (batteryMinimumSoCLimit, %), whether only essential loads are powered \
                (powerEssentialOnly; non-essential loads are typically hot water cylinders, stoves and ovens) \
                and whether the battery can be recharged from the grid (gridCharge).",
            parameters: device_only("inverter settings"),
            output: output_schema(tool),
        },
        ToolName::InverterUpdate => ToolDefinition {
            name: tool.as_str(),
            description: "Updates inverter settings. Only the settings that are provided are changed; \
                omitted settings are left untouched. Returns the applied settings or an error.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "inverter_serial_number": serial_number_property("settings update"),
                    "minimum_battery_soc": {
                        "type": "integer",
                        "minimum": 0,
                        "maximum": 100,
                        "description": "Minimum battery state of charge (%) before the battery stops discharging. Omit to leave unchanged."
                    },
                    "essential_only": {
                        "type": "boolean",
                        "description": "True powers only essential loads, false powers essential and non-essential loads. Omit to leave unchanged."
                    },
                    "grid_charge": {
                        "type": "boolean",
                        "description": "True allows the battery to be recharged from the grid, false forbids it. Omit to leave unchanged."
                    }
                },
                "required": []
            }),
            output: output_schema(tool),
        },
    }
}

/// Definitions of every tool, in registry order
pub fn all() -> Vec<ToolDefinition> {
    ToolName::ALL.iter().copied().map(definition).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_tools_are_defined() {
        let definitions = all();
        assert_eq!(definitions.len(), 6);
        let names: Vec<_> = definitions.iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec![
                "battery_state",
                "grid_state",
                "input_state",
                "inverter_settings",
                "inverter_update",
                "load_state"
            ]
        );
    }

    #[test]
    fn test_every_tool_accepts_serial_number() {
        for definition in all() {
            assert_eq!(definition.parameters["type"], "object");
            assert_eq!(
                definition.parameters["properties"]["inverter_serial_number"]["type"],
                "integer"
            );
            assert!(!definition.description.is_empty());
        }
    }

    #[test]
    fn test_every_tool_declares_ok_and_error_outputs() {
        for definition in all() {
            let variants = definition.output["oneOf"].as_array().unwrap();
            assert_eq!(variants.len(), 2, "{}", definition.name);
            assert_eq!(variants[0]["required"], json!(["ok"]));
            assert_eq!(variants[0]["properties"]["ok"]["type"], "object");
            assert_eq!(variants[1]["required"], json!(["error"]));
            assert_eq!(
                variants[1]["properties"]["error"]["properties"]["message"]["type"],
                "string"
            );
        }
    }

    #[test]
    fn test_record_schemas() {
        let battery = record_schema(ToolName::BatteryState);
        assert_eq!(
            battery["properties"]["power"]["properties"]["direction"]["enum"][0],
            "flowing into the battery"
        );
        assert_eq!(battery["required"].as_array().unwrap().len(), 6);

        let inverter = record_schema(ToolName::InverterSettings);
        assert_eq!(
            inverter["properties"]["batteryMinimumSoCLimit"]["type"],
            "integer"
        );
        assert_eq!(record_schema(ToolName::LoadState)["required"], json!(["power"]));
    }

    #[test]
    fn test_update_schema() {
        let update = definition(ToolName::InverterUpdate);
        let properties = &update.parameters["properties"];
        assert_eq!(properties["minimum_battery_soc"]["maximum"], 100);
        assert_eq!(properties["essential_only"]["type"], "boolean");
        assert_eq!(properties["grid_charge"]["type"], "boolean");
    }
}
