use lively_serialize::{Binary_Serializable, Byte_Stream};
use std::fmt;

/// Structural summary of a state block's layout.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct State_Descriptor {
    pub layout_version: u32,
    pub size: u64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Compatibility {
    Compatible,
    Version_Changed { from: u32, to: u32 },
    Size_Changed { from: u64, to: u64 },
}

impl State_Descriptor {
    pub const fn new(layout_version: u32, size: u64) -> Self {
        Self {
            layout_version,
            size,
        }
    }

    pub fn of<T>(layout_version: u32) -> Self {
        Self::new(layout_version, std::mem::size_of::<T>() as u64)
    }

    /// Whole-block check: a block survives a reload only if both version and size match.
    pub fn compatibility_with(&self, incoming: &State_Descriptor) -> Compatibility {
        if self.layout_version != incoming.layout_version {
            Compatibility::Version_Changed {
                from: self.layout_version,
                to: incoming.layout_version,
            }
        } else if self.size != incoming.size {
            Compatibility::Size_Changed {
                from: self.size,
                to: incoming.size,
            }
        } else {
            Compatibility::Compatible
        }
    }

    #[inline]
    pub fn is_compatible_with(&self, incoming: &State_Descriptor) -> bool {
        self.compatibility_with(incoming) == Compatibility::Compatible
    }
}

impl fmt::Display for State_Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{version:{}, size:{}}}", self.layout_version, self.size)
    }
}

impl Binary_Serializable for State_Descriptor {
    fn serialize(&self, output: &mut Byte_Stream) -> std::io::Result<()> {
        output.write_u32(self.layout_version)?;
        output.write_u64(self.size)
    }

    fn deserialize(input: &mut Byte_Stream) -> std::io::Result<Self> {
        let layout_version = input.read_u32()?;
        let size = input.read_u64()?;
        Ok(Self {
            layout_version,
            size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_descriptor_is_compatible() {
        let a = State_Descriptor::new(1, 128);
        assert!(a.is_compatible_with(&State_Descriptor::new(1, 128)));
    }

    #[test]
    fn version_change_wins_over_size_change() {
        let a = State_Descriptor::new(1, 128);
        assert_eq!(
            a.compatibility_with(&State_Descriptor::new(2, 256)),
            Compatibility::Version_Changed { from: 1, to: 2 }
        );
        assert_eq!(
            a.compatibility_with(&State_Descriptor::new(1, 256)),
            Compatibility::Size_Changed { from: 128, to: 256 }
        );
    }

    #[test]
    fn descriptor_of_type() {
        #[allow(dead_code)]
        struct Sixteen([u64; 2]);
        assert_eq!(State_Descriptor::of::<Sixteen>(3), State_Descriptor::new(3, 16));
    }

    #[test]
    fn serialized_layout() {
        let mut stream = Byte_Stream::new();
        State_Descriptor::new(2, 256).serialize(&mut stream).unwrap();
        assert_eq!(stream.len(), 12);
        stream.seek(0);
        assert_eq!(
            State_Descriptor::deserialize(&mut stream).unwrap(),
            State_Descriptor::new(2, 256)
        );
    }

    #[test]
    fn display() {
        assert_eq!(State_Descriptor::new(1, 128).to_string(), "{version:1, size:128}");
    }
}
