use std::convert::{From, TryFrom};

#[derive(Debug, PartialEq, Clone)]
pub enum Cfg_Value {
    Nil,
    Bool(bool),
    Int(i32),
    Float(f32),
    String(String),
}

macro_rules! impl_cfg_value {
    ($type: ty => $val: ident) => {
        impl From<$type> for Cfg_Value {
            fn from(v: $type) -> Cfg_Value {
                Cfg_Value::$val(v)
            }
        }

        impl TryFrom<Cfg_Value> for $type {
            type Error = ();

            fn try_from(v: Cfg_Value) -> Result<Self, Self::Error> {
                if let Cfg_Value::$val(b) = v {
                    Ok(b)
                } else {
                    Err(())
                }
            }
        }
    };
}

impl_cfg_value!(bool => Bool);
impl_cfg_value!(i32 => Int);
impl_cfg_value!(f32 => Float);
impl_cfg_value!(String => String);

// Unsigned values are stored as Int, so that "target_fps 60" can be read as either.
impl From<u32> for Cfg_Value {
    fn from(v: u32) -> Cfg_Value {
        Cfg_Value::Int(v as i32)
    }
}

impl TryFrom<Cfg_Value> for u32 {
    type Error = ();

    fn try_from(v: Cfg_Value) -> Result<Self, Self::Error> {
        match v {
            Cfg_Value::Int(i) if i >= 0 => Ok(i as u32),
            _ => Err(()),
        }
    }
}

impl TryFrom<Cfg_Value> for u64 {
    type Error = ();

    fn try_from(v: Cfg_Value) -> Result<Self, Self::Error> {
        u32::try_from(v).map(u64::from)
    }
}
