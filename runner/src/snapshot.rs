use lively_api::state_block::{self, State_Block};
use lively_api::State_Descriptor;
use lively_serialize::{Binary_Serializable, Byte_Stream};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const SNAPSHOT_MAGIC: u32 = 0x5353_564c;

/// A raw copy of a state block's payload, taken right before the block is discarded.
#[derive(Clone, Debug, PartialEq)]
pub struct State_Snapshot {
    pub descriptor: State_Descriptor,
    pub generation: u32,
    pub bytes: Vec<u8>,
}

impl State_Snapshot {
    /// # Safety
    /// `block` must be null or a live state block.
    pub unsafe fn capture(block: *const State_Block, generation: u32) -> Option<Self> {
        let descriptor = state_block::descriptor_of(block)?;
        let bytes = state_block::payload_bytes(block)?.to_vec();
        Some(State_Snapshot {
            descriptor,
            generation,
            bytes,
        })
    }

    /// `lost_state_<unix secs>-<pid>_gen<generation>_v<layout version>.bin`, so dumps from
    /// different runs don't overwrite each other.
    pub fn file_name(&self) -> String {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |t| t.as_secs());
        format!(
            "lost_state_{}-{}_gen{}_v{}.bin",
            secs,
            std::process::id(),
            self.generation,
            self.descriptor.layout_version
        )
    }

    pub fn dump(&self, dir: &Path) -> io::Result<PathBuf> {
        let mut stream = Byte_Stream::new();
        self.serialize(&mut stream)?;
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        std::fs::write(&path, stream.into_vec())?;
        Ok(path)
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        let data = std::fs::read(path)?;
        Self::deserialize(&mut Byte_Stream::new_from_vec(data))
    }
}

impl Binary_Serializable for State_Snapshot {
    fn serialize(&self, output: &mut Byte_Stream) -> io::Result<()> {
        output.write_u32(SNAPSHOT_MAGIC)?;
        self.descriptor.serialize(output)?;
        output.write_u32(self.generation)?;
        output.write_bytes(&self.bytes)
    }

    fn deserialize(input: &mut Byte_Stream) -> io::Result<Self> {
        let magic = input.read_u32()?;
        if magic != SNAPSHOT_MAGIC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("not a state snapshot (magic {:#x})", magic),
            ));
        }
        let descriptor = State_Descriptor::deserialize(input)?;
        let generation = input.read_u32()?;
        let bytes = input.read_bytes()?;
        if bytes.len() as u64 != descriptor.size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "snapshot has {} bytes but its descriptor says {}",
                    bytes.len(),
                    descriptor
                ),
            ));
        }
        Ok(State_Snapshot {
            descriptor,
            generation,
            bytes,
        })
    }
}
