//! Outbound telemetry record and its line encoding.

/// One telemetry event sent to the bot.
///
/// `name` and `params` must not contain embedded newlines; the encoding is
/// one record per line.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub time: f32,
    pub name: String,
    pub pos: (f32, f32),
    pub params: String,
}

impl Event {
    pub fn new(time: f32, name: &str, pos: (f32, f32), params: &str) -> Self {
        Event {
            time,
            name: name.to_string(),
            pos,
            params: params.to_string(),
        }
    }

    /// Encode to wire format: `<time> <pos_x>,<pos_y> <name> <params>\n`
    pub fn encode(&self) -> String {
        format!(
            "{} {},{} {} {}\n",
            self.time, self.pos.0, self.pos.1, self.name, self.params
        )
    }
}
