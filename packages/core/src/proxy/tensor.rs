use ndarray::{ArrayD, IxDyn};
use tjs_handle::{ElementType, ForeignValue, Handle, TypedArray};
use tracing::debug;

use crate::proxy::{Axis, ForeignProxy, GenericProxy, Index, Proxy, Slice};
use crate::{Error, Kwargs, Result, Value};

/// A `Tensor` instance.
///
/// Subscripts with positions and slices are translated into the tensor's own
/// `slice` method and yield tensors again.
#[derive(Clone, Debug)]
pub struct TensorProxy(GenericProxy);

/// Tensor contents copied to the local side, typed by the tensor's `type`.
#[derive(Clone, Debug, PartialEq)]
pub enum TensorArray {
    Int8(ArrayD<i8>),
    Uint8(ArrayD<u8>),
    Int16(ArrayD<i16>),
    Uint16(ArrayD<u16>),
    Int32(ArrayD<i32>),
    Uint32(ArrayD<u32>),
    Int64(ArrayD<i64>),
    Uint64(ArrayD<u64>),
    Float32(ArrayD<f32>),
    Float64(ArrayD<f64>),
    Bool(ArrayD<bool>),
}

impl TensorArray {
    pub fn element_type(&self) -> ElementType {
        match self {
            TensorArray::Int8(_) => ElementType::Int8,
            TensorArray::Uint8(_) => ElementType::Uint8,
            TensorArray::Int16(_) => ElementType::Int16,
            TensorArray::Uint16(_) => ElementType::Uint16,
            TensorArray::Int32(_) => ElementType::Int32,
            TensorArray::Uint32(_) => ElementType::Uint32,
            TensorArray::Int64(_) => ElementType::Int64,
            TensorArray::Uint64(_) => ElementType::Uint64,
            TensorArray::Float32(_) => ElementType::Float32,
            TensorArray::Float64(_) => ElementType::Float64,
            TensorArray::Bool(_) => ElementType::Bool,
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            TensorArray::Int8(a) => a.shape(),
            TensorArray::Uint8(a) => a.shape(),
            TensorArray::Int16(a) => a.shape(),
            TensorArray::Uint16(a) => a.shape(),
            TensorArray::Int32(a) => a.shape(),
            TensorArray::Uint32(a) => a.shape(),
            TensorArray::Int64(a) => a.shape(),
            TensorArray::Uint64(a) => a.shape(),
            TensorArray::Float32(a) => a.shape(),
            TensorArray::Float64(a) => a.shape(),
            TensorArray::Bool(a) => a.shape(),
        }
    }

    pub fn as_f32(&self) -> Option<&ArrayD<f32>> {
        match self {
            TensorArray::Float32(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<&ArrayD<i64>> {
        match self {
            TensorArray::Int64(a) => Some(a),
            _ => None,
        }
    }

    /// Widen to `f64`, `true` as 1.
    pub fn to_f64(&self) -> ArrayD<f64> {
        match self {
            TensorArray::Int8(a) => a.mapv(f64::from),
            TensorArray::Uint8(a) => a.mapv(f64::from),
            TensorArray::Int16(a) => a.mapv(f64::from),
            TensorArray::Uint16(a) => a.mapv(f64::from),
            TensorArray::Int32(a) => a.mapv(f64::from),
            TensorArray::Uint32(a) => a.mapv(f64::from),
            TensorArray::Int64(a) => a.mapv(|v| v as f64),
            TensorArray::Uint64(a) => a.mapv(|v| v as f64),
            TensorArray::Float32(a) => a.mapv(f64::from),
            TensorArray::Float64(a) => a.clone(),
            TensorArray::Bool(a) => a.mapv(|v| if v { 1.0 } else { 0.0 }),
        }
    }
}

fn reshape(typed: &TypedArray, dims: &[usize]) -> Result<TensorArray> {
    macro_rules! shaped {
        ($variant:ident, $ty:ty) => {{
            let values = typed.to_vec::<$ty>().ok_or_else(|| {
                Error::conversion(format!("tensor data is not {}", typed.element_type))
            })?;
            TensorArray::$variant(ArrayD::from_shape_vec(IxDyn(dims), values).map_err(|e| {
                Error::conversion(format!("tensor data does not fit dims {:?}: {}", dims, e))
            })?)
        }};
    }

    Ok(match typed.element_type {
        ElementType::Int8 => shaped!(Int8, i8),
        ElementType::Uint8 => shaped!(Uint8, u8),
        ElementType::Int16 => shaped!(Int16, i16),
        ElementType::Uint16 => shaped!(Uint16, u16),
        ElementType::Int32 => shaped!(Int32, i32),
        ElementType::Uint32 => shaped!(Uint32, u32),
        ElementType::Int64 => shaped!(Int64, i64),
        ElementType::Uint64 => shaped!(Uint64, u64),
        ElementType::Float32 => shaped!(Float32, f32),
        ElementType::Float64 => shaped!(Float64, f64),
        ElementType::Bool => shaped!(Bool, bool),
    })
}

impl TensorProxy {
    pub fn new(inner: GenericProxy) -> Self {
        Self(inner)
    }

    pub fn generic(&self) -> &GenericProxy {
        &self.0
    }

    pub fn into_generic(self) -> GenericProxy {
        self.0
    }

    /// The tensor's shape.
    pub fn dims(&self) -> Result<Vec<usize>> {
        let dims = match self.0.handle().get("dims")? {
            ForeignValue::Handle(h) => h.materialize()?,
            other => other,
        };
        match dims {
            ForeignValue::Array(items) => items
                .iter()
                .map(|d| {
                    d.as_usize()
                        .ok_or_else(|| Error::conversion("tensor dims must be sizes"))
                })
                .collect(),
            other => Err(Error::conversion(format!(
                "tensor dims is not an array: {:?}",
                other
            ))),
        }
    }

    /// The declared element type.
    pub fn element_type(&self) -> Result<ElementType> {
        let name = self.0.handle().get("type")?;
        let name = name
            .as_str()
            .ok_or_else(|| Error::conversion("tensor type is not a string"))?;
        ElementType::from_name(name)
            .ok_or_else(|| Error::conversion(format!("unsupported tensor type: {}", name)))
    }

    /// Copy the contents into a local array shaped by `dims`.
    pub fn to_array(&self) -> Result<TensorArray> {
        let element_type = self.element_type()?;
        let typed = match self.0.handle().get("data")? {
            ForeignValue::Typed(t) => t,
            ForeignValue::Bytes(b) => TypedArray::new(ElementType::Uint8, b),
            other => {
                return Err(Error::conversion(format!(
                    "tensor data is not a typed array: {:?}",
                    other
                )))
            }
        };
        if typed.element_type != element_type {
            return Err(Error::conversion(format!(
                "tensor data is {} but its type is {}",
                typed.element_type, element_type
            )));
        }
        reshape(&typed, &self.dims()?)
    }

    /// `[start, stop]` for one axis. Missing bounds become `0` and the axis
    /// size, since the library wants explicit numbers.
    fn compile_slice(
        &self,
        slice: Slice,
        axis: usize,
        dims: &mut Option<Vec<usize>>,
    ) -> Result<ForeignValue> {
        if let Some(step) = slice.step {
            if step != 1 {
                return Err(Error::precondition(format!(
                    "step is not supported for slicing, got {}",
                    step
                )));
            }
        }
        let start = slice.start.unwrap_or(0);
        let stop = match slice.stop {
            Some(stop) => stop,
            None => {
                if dims.is_none() {
                    *dims = Some(self.dims()?);
                }
                let dims = dims.as_deref().unwrap_or_default();
                let size = dims.get(axis).ok_or_else(|| {
                    Error::precondition(format!(
                        "axis {} is out of range for a tensor with {} dims",
                        axis,
                        dims.len()
                    ))
                })?;
                *size as i64
            }
        };
        Ok(ForeignValue::Array(vec![
            ForeignValue::Integer(start),
            ForeignValue::Integer(stop),
        ]))
    }
}

impl ForeignProxy for TensorProxy {
    fn handle(&self) -> &Handle {
        self.0.handle()
    }

    fn get(&self, name: &str) -> Result<Value> {
        self.0.get(name)
    }

    fn set(&self, name: &str, value: Value) -> Result<()> {
        self.0.set(name, value)
    }

    fn call(&self, args: Vec<Value>, kwargs: Kwargs) -> Result<Value> {
        self.0.call(args, kwargs)
    }

    fn index(&self, key: Index) -> Result<Value> {
        let mut dims = None;
        let slices = match key {
            Index::Name(_) => return self.0.index(key),
            Index::Position(i) => vec![ForeignValue::Integer(i)],
            Index::Slice(slice) => vec![self.compile_slice(slice, 0, &mut dims)?],
            Index::Axes(axes) => {
                let mut slices = Vec::with_capacity(axes.len());
                for (i, axis) in axes.into_iter().enumerate() {
                    slices.push(match axis {
                        Axis::At(n) => ForeignValue::Integer(n),
                        Axis::Range(slice) => self.compile_slice(slice, i, &mut dims)?,
                    });
                }
                slices
            }
        };

        debug!(?slices, "Slicing tensor");
        match self.0.handle().call_method("slice", slices)? {
            ForeignValue::Handle(sliced) => {
                let library = self.0.library().clone();
                Ok(Value::Proxy(Proxy::Tensor(TensorProxy::new(
                    GenericProxy::new(sliced, library)?,
                ))))
            }
            other => self.0.library().decode(other),
        }
    }

    fn set_item(&self, key: Index, value: Value) -> Result<()> {
        self.0.set_item(key, value)
    }
}
