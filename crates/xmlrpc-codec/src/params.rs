use bytes::Bytes;

use crate::encode::{encode, Encoder, ToXmlRpc};
use crate::error::Result;
use crate::value::Value;

/// Encoded positional arguments of a call.
///
/// Each entry is a `<value>` fragment, or empty for an omitted argument.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    values: Vec<Bytes>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode and append one argument.
    pub fn push<T: ToXmlRpc + ?Sized>(&mut self, value: &T) -> Result<()> {
        let fragment = if value.is_omitted() {
            Bytes::new()
        } else {
            encode(value)?
        };
        self.values.push(fragment);
        Ok(())
    }

    pub fn with<T: ToXmlRpc + ?Sized>(mut self, value: &T) -> Result<Self> {
        self.push(value)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The encoded fragments in order.
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.values.iter().map(|v| v.as_ref())
    }
}

/// Params travel inside `system.multicall` as an array.
impl ToXmlRpc for Params {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.raw(b"<value><array><data>");
        for fragment in &self.values {
            enc.raw(fragment);
        }
        enc.raw(b"</data></array></value>");
        Ok(())
    }
}

/// Conversion into call arguments.
///
/// Implemented for tuples of encodable values, `()` for no arguments,
/// `Vec<Value>` and [`Params`] itself.
pub trait IntoParams {
    fn into_params(self) -> Result<Params>;
}

impl IntoParams for Params {
    fn into_params(self) -> Result<Params> {
        Ok(self)
    }
}

impl IntoParams for () {
    fn into_params(self) -> Result<Params> {
        Ok(Params::new())
    }
}

impl IntoParams for Vec<Value> {
    fn into_params(self) -> Result<Params> {
        let mut params = Params::new();
        for value in &self {
            params.push(value)?;
        }
        Ok(params)
    }
}

macro_rules! tuple_params {
    ($($name:ident),+) => {
        impl<$($name: ToXmlRpc),+> IntoParams for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_params(self) -> Result<Params> {
                let ($($name,)+) = self;
                let mut params = Params::new();
                $(params.push(&$name)?;)+
                Ok(params)
            }
        }
    };
}

tuple_params!(A);
tuple_params!(A, B);
tuple_params!(A, B, C);
tuple_params!(A, B, C, D);
tuple_params!(A, B, C, D, E);
tuple_params!(A, B, C, D, E, F);
tuple_params!(A, B, C, D, E, F, G);
tuple_params!(A, B, C, D, E, F, G, H);

/// One call in a batch: a method name and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    method: String,
    params: Params,
}

impl Call {
    pub fn new(method: impl Into<String>, params: impl IntoParams) -> Result<Self> {
        Ok(Self {
            method: method.into(),
            params: params.into_params()?,
        })
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn params(&self) -> &Params {
        &self.params
    }
}

/// Encoded as `{methodName, params}`, the multicall entry shape.
impl ToXmlRpc for Call {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.structure(|enc| {
            enc.member("methodName", self.method.as_str())?;
            enc.member("params", &self.params)
        })
    }
}
