//! 录制文件格式
//!
//! 统一的轨迹录制持久化格式，录制与回放工具共用：
//!
//! ```text
//! [Magic: 8 bytes "EGRTREC\0"]
//! [Version: 1 byte]
//! [Body: bincode 序列化的 Recording]
//! ```

use crate::error::MotionError;
use crate::recorder::Recording;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

/// 文件魔数
const MAGIC: &[u8; 8] = b"EGRTREC\0";

/// 当前格式版本
const FORMAT_VERSION: u8 = 1;

impl Recording {
    /// 保存到文件
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), MotionError> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);

        writer.write_all(MAGIC)?;
        writer.write_all(&[FORMAT_VERSION])?;

        bincode::serialize_into(&mut writer, self)
            .map_err(|err| MotionError::Serialization(err.to_string()))?;
        writer.flush()?;

        debug!(path = %path.as_ref().display(), samples = self.len(), "recording saved");
        Ok(())
    }

    /// 从文件加载
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MotionError> {
        let file = File::open(path.as_ref())?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(MotionError::CorruptRecording(
                "bad magic header".to_string(),
            ));
        }

        let mut version = [0u8; 1];
        reader.read_exact(&mut version)?;
        if version[0] != FORMAT_VERSION {
            return Err(MotionError::CorruptRecording(format!(
                "unsupported format version: {}",
                version[0]
            )));
        }

        let recording = bincode::deserialize_from(&mut reader)
            .map_err(|err| MotionError::CorruptRecording(err.to_string()))?;

        debug!(path = %path.as_ref().display(), "recording loaded");
        Ok(recording)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecordedSample;

    fn sample_recording() -> Recording {
        let mut recording = Recording::empty(100.0);
        recording.samples.insert(
            "arm.shoulder_pitch".to_string(),
            (0..50)
                .map(|k| RecordedSample {
                    t: k as f64 / 100.0,
                    position: k as f64 * 0.3,
                    compliant: false,
                })
                .collect(),
        );
        recording.samples.insert(
            "arm.elbow_pitch".to_string(),
            (0..50)
                .map(|k| RecordedSample {
                    t: k as f64 / 100.0,
                    position: -(k as f64) * 0.1,
                    compliant: true,
                })
                .collect(),
        );
        recording
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wave.egr");

        let recording = sample_recording();
        recording.save(&path).unwrap();

        let loaded = Recording::load(&path).unwrap();
        assert_eq!(loaded, recording);
    }

    #[test]
    fn test_load_rejects_bad_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.egr");
        std::fs::write(&path, b"NOTAREC\0rest-of-garbage").unwrap();

        assert!(matches!(
            Recording::load(&path),
            Err(MotionError::CorruptRecording(_))
        ));
    }

    #[test]
    fn test_load_rejects_unknown_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.egr");

        let mut bytes = Vec::new();
        bytes.extend_from_slice(MAGIC);
        bytes.push(99); // 未来版本
        std::fs::write(&path, bytes).unwrap();

        match Recording::load(&path) {
            Err(MotionError::CorruptRecording(message)) => {
                assert!(message.contains("99"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        assert!(matches!(
            Recording::load("/nonexistent/path/rec.egr"),
            Err(MotionError::Io(_))
        ));
    }
}
