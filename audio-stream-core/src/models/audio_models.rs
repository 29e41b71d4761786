use serde::{Deserialize, Serialize};

/// An enumerable audio input device.
///
/// Snapshot taken at listing time; nothing holds on to it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioDeviceDescriptor {
    pub name: String,
    pub id: String,
    pub channel_count: u16,
    pub sample_rate: u32,
}

impl AudioDeviceDescriptor {
    /// Whether `query` selects this device (case-sensitive substring match).
    pub fn matches(&self, query: &str) -> bool {
        self.name.contains(query)
    }
}

/// Pick the first device whose name contains `query`.
pub fn find_device<'a>(
    devices: &'a [AudioDeviceDescriptor],
    query: &str,
) -> Option<&'a AudioDeviceDescriptor> {
    devices.iter().find(|d| d.matches(query))
}
