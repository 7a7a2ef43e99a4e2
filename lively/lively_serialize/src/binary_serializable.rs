use super::byte_stream::Byte_Stream;

pub trait Binary_Serializable: Sized {
    fn serialize(&self, output: &mut Byte_Stream) -> std::io::Result<()>;

    fn deserialize(input: &mut Byte_Stream) -> std::io::Result<Self>;
}

impl Binary_Serializable for u32 {
    fn serialize(&self, output: &mut Byte_Stream) -> std::io::Result<()> {
        output.write_u32(*self)
    }

    fn deserialize(input: &mut Byte_Stream) -> std::io::Result<Self> {
        input.read_u32()
    }
}

impl Binary_Serializable for u64 {
    fn serialize(&self, output: &mut Byte_Stream) -> std::io::Result<()> {
        output.write_u64(*self)
    }

    fn deserialize(input: &mut Byte_Stream) -> std::io::Result<Self> {
        input.read_u64()
    }
}
