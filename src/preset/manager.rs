//! Preset slot protocol.
//!
//! Every call round-trips to the device; nothing is cached. Errors from
//! the session are passed through unchanged.

use embassy_sync::blocking_mutex::raw::RawMutex;

use super::{decode_preset_list, Preset, PresetEntry, PresetFormat};
use crate::ble::{DeviceSession, GattLink};
use crate::config::MAX_PRESETS;
use crate::error::Error;
use crate::params;

pub struct PresetManager<'a, M: RawMutex, L: GattLink> {
    session: DeviceSession<'a, M, L>,
    format: PresetFormat,
}

impl<'a, M: RawMutex, L: GattLink> PresetManager<'a, M, L> {
    /// Use the record format from the connection's `SessionConfig`.
    pub fn new(session: DeviceSession<'a, M, L>) -> Self {
        let format = session.connection().config().preset_format;
        Self::with_format(session, format)
    }

    pub fn with_format(session: DeviceSession<'a, M, L>, format: PresetFormat) -> Self {
        Self { session, format }
    }

    pub fn format(&self) -> PresetFormat {
        self.format
    }

    /// Store `preset` in slot `preset.index`.
    pub async fn save(&self, preset: &Preset) -> Result<(), Error> {
        log_info!("Saving preset {} '{}'", preset.index, preset.name.as_str());
        let record = self.format.encode(preset)?;
        self.session.write(params::PresetSave, &record).await
    }

    /// Fetch slot `index`. `None` if the slot is empty.
    pub async fn load(&self, index: u8) -> Result<Option<Preset>, Error> {
        self.session.write(params::PresetSelectIndex, &index).await?;
        let record = self.session.read(params::PresetRead).await?;
        if record.is_empty() {
            return Ok(None);
        }
        let preset = self.format.decode(&record)?;
        if preset.name.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(preset))
    }

    /// Occupied slots, in slot order.
    pub async fn list(&self) -> Result<heapless::Vec<PresetEntry, MAX_PRESETS>, Error> {
        let table = self.session.read(params::PresetList).await?;
        decode_preset_list(&table)
    }

    /// Apply slot `index` on the device.
    pub async fn activate(&self, index: u8) -> Result<(), Error> {
        log_info!("Activating preset {}", index);
        self.session.write(params::PresetActivate, &index).await
    }

    pub async fn delete(&self, index: u8) -> Result<(), Error> {
        log_info!("Deleting preset {}", index);
        self.session.write(params::PresetDelete, &index).await
    }

    /// Slot the device last activated.
    pub async fn active_index(&self) -> Result<u8, Error> {
        self.session.read(params::PresetReadActivatedIndex).await
    }

    /// The device's live settings packaged as a preset record.
    pub async fn current_settings_as_preset(&self) -> Result<Preset, Error> {
        let record = self.session.read(params::SettingsAsPreset).await?;
        self.format.decode(&record)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;
    use crate::ble::session::tests::{device_test, LinkScript, Req, Script, ADDR};
    use crate::config::SessionConfig;
    use crate::error::{LinkError, Malformed};
    use crate::params::ParamId;
    use crate::preset::tests::{sample_preset, slider_preset};
    use crate::preset::{encode_preset_list, truncate_name};

    /// The peripheral serves `PresetRead` from a register, so a test that
    /// selects a slot must seed the register with that slot's record.
    fn seed(script: &Script, format: PresetFormat, preset: &Preset) {
        script.set(ParamId::PresetRead, format.encode(preset).unwrap());
    }

    #[test]
    fn save_writes_compressed_record_by_default() {
        device_test!(|conn, script, _monitor| {
            conn.connect(ADDR).await.unwrap();
            let presets = PresetManager::new(DeviceSession::new(conn));
            assert_eq!(presets.format(), PresetFormat::CompressedCsv);

            let p = sample_preset();
            presets.save(&p).await.unwrap();
            let stored = script.get(ParamId::PresetSave).unwrap();
            assert_eq!(PresetFormat::CompressedCsv.decode(&stored), Ok(p));
        });
    }

    #[test]
    fn load_selects_slot_then_reads() {
        device_test!(|conn, script, monitor| {
            conn.connect(ADDR).await.unwrap();
            let presets = PresetManager::new(DeviceSession::new(conn));
            let p = sample_preset();
            seed(script, PresetFormat::CompressedCsv, &p);

            assert_eq!(presets.load(1).await, Ok(Some(p)));
            assert_eq!(script.get(ParamId::PresetSelectIndex), Some(vec![1]));

            let gatt: Vec<Req> = monitor
                .requests
                .borrow()
                .iter()
                .filter(|r| matches!(r, Req::Read(_) | Req::Write(..)))
                .cloned()
                .collect();
            assert_eq!(
                gatt,
                vec![
                    Req::Write(ParamId::PresetSelectIndex.uuid(), vec![1]),
                    Req::Read(ParamId::PresetRead.uuid()),
                ]
            );
        });
    }

    #[test]
    fn slider_preset_saves_and_loads() {
        device_test!(|conn, script, _monitor| {
            conn.connect(ADDR).await.unwrap();
            let presets = PresetManager::new(DeviceSession::new(conn));
            let p = slider_preset();

            presets.save(&p).await.unwrap();
            let stored = script.get(ParamId::PresetSave).unwrap();
            assert!(stored.len() > 222);

            script.set(ParamId::PresetRead, stored);
            assert_eq!(presets.load(1).await, Ok(Some(p)));
        });
    }

    #[test]
    fn binary_format_is_selectable() {
        device_test!(
            SessionConfig {
                preset_format: PresetFormat::Binary,
                ..SessionConfig::default()
            },
            Script::default(),
            |_link| (),
            |conn, script, _monitor| {
                conn.connect(ADDR).await.unwrap();
                let presets = PresetManager::new(DeviceSession::new(conn));
                let p = sample_preset();
                presets.save(&p).await.unwrap();
                assert_eq!(script.get(ParamId::PresetSave).map(|r| r.len()), Some(222));

                seed(script, PresetFormat::Binary, &p);
                assert_eq!(presets.load(1).await, Ok(Some(p)));
            }
        );
    }

    #[test]
    fn empty_slot_loads_as_none() {
        device_test!(|conn, script, _monitor| {
            conn.connect(ADDR).await.unwrap();
            let presets = PresetManager::new(DeviceSession::new(conn));

            script.set(ParamId::PresetRead, Vec::new());
            assert_eq!(presets.load(4).await, Ok(None));

            let mut unnamed = sample_preset();
            unnamed.name = truncate_name("");
            seed(script, PresetFormat::CompressedCsv, &unnamed);
            assert_eq!(presets.load(4).await, Ok(None));
        });
    }

    #[test]
    fn corrupt_record_is_an_error() {
        device_test!(|conn, script, _monitor| {
            conn.connect(ADDR).await.unwrap();
            let presets = PresetManager::new(DeviceSession::new(conn));
            script.set(ParamId::PresetRead, vec![1, 2, 3]);
            assert_eq!(
                presets.load(0).await,
                Err(Error::MalformedPayload(Malformed::Compression))
            );
        });
    }

    #[test]
    fn list_skips_free_slots() {
        device_test!(|conn, script, _monitor| {
            conn.connect(ADDR).await.unwrap();
            let presets = PresetManager::new(DeviceSession::new(conn));
            let mut rows = Vec::new();
            for i in 0..24u8 {
                let name = if i % 8 == 3 { "Slot" } else { "" };
                rows.push(PresetEntry {
                    index: i,
                    name: truncate_name(name),
                });
            }
            script.set(ParamId::PresetList, encode_preset_list(&rows));

            let list = presets.list().await.unwrap();
            let indices: Vec<u8> = list.iter().map(|e| e.index).collect();
            assert_eq!(indices, vec![3, 11, 19]);
        });
    }

    #[test]
    fn activate_delete_and_active_index() {
        device_test!(|conn, script, _monitor| {
            conn.connect(ADDR).await.unwrap();
            let presets = PresetManager::new(DeviceSession::new(conn));

            presets.activate(7).await.unwrap();
            assert_eq!(script.get(ParamId::PresetActivate), Some(vec![7]));
            presets.delete(2).await.unwrap();
            assert_eq!(script.get(ParamId::PresetDelete), Some(vec![2]));

            script.set(ParamId::PresetReadActivatedIndex, vec![7]);
            assert_eq!(presets.active_index().await, Ok(7));
        });
    }

    #[test]
    fn current_settings_come_back_as_preset() {
        device_test!(|conn, script, _monitor| {
            conn.connect(ADDR).await.unwrap();
            let presets = PresetManager::new(DeviceSession::new(conn));
            let p = sample_preset();
            let record = PresetFormat::CompressedCsv.encode(&p).unwrap();
            script.set(ParamId::SettingsAsPreset, record);
            assert_eq!(presets.current_settings_as_preset().await, Ok(p));
        });
    }

    #[test]
    fn session_errors_pass_through() {
        device_test!(
            SessionConfig::default(),
            Script {
                link: LinkScript::Drop,
                ..Script::default()
            },
            |_link| (),
            |conn, _script, _monitor| {
                let presets = PresetManager::new(DeviceSession::new(conn));
                assert_eq!(
                    presets.list().await,
                    Err(Error::Link(LinkError::NotConnected))
                );
                assert_eq!(conn.connect(ADDR).await, Err(Error::Cancelled));
                assert_eq!(
                    presets.activate(1).await,
                    Err(Error::Link(LinkError::NotConnected))
                );
            }
        );
    }
}
