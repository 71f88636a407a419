//!
//! Value types of scene attributes.
//!

/// Scalar component type of an attribute.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Half,
    Float,
    Double,
    Int,
    Bool,
    String,
}

/// Semantic role of an attribute, which refines how its values are interpreted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    None,
    TexCoord,
    Color,
    Normal,
    Point,
    Vector,
}

/// The declared type of an attribute: scalar kind, number of components and role.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ValueType {
    pub scalar: ScalarKind,
    pub dim: usize,
    pub role: Role,
}

macro_rules! value_types {
    ($($name:ident = ($scalar:ident, $dim:expr, $role:ident);)*) => {
        impl ValueType {
            $(pub const $name: ValueType = ValueType {
                scalar: ScalarKind::$scalar,
                dim: $dim,
                role: Role::$role,
            };)*
        }
    };
}

value_types! {
    FLOAT = (Float, 1, None);
    FLOAT2 = (Float, 2, None);
    FLOAT3 = (Float, 3, None);
    FLOAT4 = (Float, 4, None);
    DOUBLE = (Double, 1, None);
    DOUBLE2 = (Double, 2, None);
    DOUBLE3 = (Double, 3, None);
    HALF = (Half, 1, None);
    HALF2 = (Half, 2, None);
    HALF3 = (Half, 3, None);
    INT = (Int, 1, None);
    BOOL = (Bool, 1, None);
    STRING = (String, 1, None);
    TEXCOORD2F = (Float, 2, TexCoord);
    TEXCOORD2D = (Double, 2, TexCoord);
    TEXCOORD2H = (Half, 2, TexCoord);
    TEXCOORD3F = (Float, 3, TexCoord);
    TEXCOORD3D = (Double, 3, TexCoord);
    TEXCOORD3H = (Half, 3, TexCoord);
    COLOR3F = (Float, 3, Color);
    COLOR3D = (Double, 3, Color);
    COLOR3H = (Half, 3, Color);
    COLOR4F = (Float, 4, Color);
    NORMAL3F = (Float, 3, Normal);
    POINT3F = (Float, 3, Point);
    VECTOR3F = (Float, 3, Vector);
}

impl ValueType {
    /// Whether values of this type can be cast to a vector of floats.
    pub fn is_numeric(&self) -> bool {
        !matches!(self.scalar, ScalarKind::Bool | ScalarKind::String)
    }

    pub fn is_texcoord(&self) -> bool {
        self.role == Role::TexCoord
    }

    pub fn is_color3(&self) -> bool {
        self.role == Role::Color && self.dim == 3
    }

    /// Two component floating point type without a role.
    pub fn is_plain_float2(&self) -> bool {
        self.role == Role::None
            && self.dim == 2
            && matches!(self.scalar, ScalarKind::Float | ScalarKind::Double | ScalarKind::Half)
    }

    /// The type name as written in scene description files, e.g. `texCoord2f`.
    pub fn name(&self) -> String {
        let suffix = match self.scalar {
            ScalarKind::Half => "h",
            ScalarKind::Float => "f",
            ScalarKind::Double => "d",
            ScalarKind::Int => return dim_name("int", self.dim),
            ScalarKind::Bool => return dim_name("bool", self.dim),
            ScalarKind::String => return dim_name("string", self.dim),
        };
        let base = match self.role {
            Role::None => {
                let scalar = match self.scalar {
                    ScalarKind::Half => "half",
                    ScalarKind::Double => "double",
                    _ => "float",
                };
                return dim_name(scalar, self.dim);
            }
            Role::TexCoord => "texCoord",
            Role::Color => "color",
            Role::Normal => "normal",
            Role::Point => "point",
            Role::Vector => "vector",
        };
        format!("{}{}{}", base, self.dim, suffix)
    }
}

fn dim_name(scalar: &str, dim: usize) -> String {
    if dim == 1 {
        scalar.to_string()
    } else {
        format!("{}{}", scalar, dim)
    }
}

/// Flat array storage of attribute values. Tuples are stored component after component.
#[derive(Clone, Debug, PartialEq)]
pub enum ArrayValue {
    Float(Vec<f32>),
    Double(Vec<f64>),
    Int(Vec<i32>),
    Bool(Vec<bool>),
    String(Vec<String>),
}

impl ArrayValue {
    /// Flatten tuples of floats, keeping the first `dim` components of each.
    pub fn from_tuples(values: &[[f32; 3]], dim: usize) -> Self {
        if dim == 3 {
            return ArrayValue::Float(bytemuck::cast_slice(values).to_vec());
        }
        let dim = dim.min(3);
        ArrayValue::Float(values.iter().flat_map(|v| v[..dim].iter().copied()).collect())
    }

    /// Number of scalars stored.
    pub fn len(&self) -> usize {
        match self {
            ArrayValue::Float(v) => v.len(),
            ArrayValue::Double(v) => v.len(),
            ArrayValue::Int(v) => v.len(),
            ArrayValue::Bool(v) => v.len(),
            ArrayValue::String(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cast to single precision scalars, if the values are numeric.
    pub fn to_f32(&self) -> Option<Vec<f32>> {
        match self {
            ArrayValue::Float(v) => Some(v.clone()),
            ArrayValue::Double(v) => Some(v.iter().map(|&x| x as f32).collect()),
            ArrayValue::Int(v) => Some(v.iter().map(|&x| x as f32).collect()),
            ArrayValue::Bool(_) | ArrayValue::String(_) => None,
        }
    }

    /// Regroup the scalars into tuples of `dim` components, keeping at most 3 of them.
    ///
    /// Trailing scalars that do not fill a whole tuple are ignored.
    pub fn to_tuples(&self, dim: usize) -> Option<Vec<[f32; 3]>> {
        if dim == 0 {
            return None;
        }
        let flat = self.to_f32()?;
        Some(
            flat.chunks_exact(dim)
                .map(|c| {
                    let mut v = [0.0; 3];
                    for (dst, src) in v.iter_mut().zip(c.iter()) {
                        *dst = *src;
                    }
                    v
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names() {
        assert_eq!(ValueType::TEXCOORD2F.name(), "texCoord2f");
        assert_eq!(ValueType::COLOR3H.name(), "color3h");
        assert_eq!(ValueType::FLOAT.name(), "float");
        assert_eq!(ValueType::DOUBLE2.name(), "double2");
        assert_eq!(ValueType::INT.name(), "int");
        assert!(ValueType::HALF2.is_plain_float2());
        assert!(!ValueType::TEXCOORD2F.is_plain_float2());
        assert!(!ValueType::STRING.is_numeric());
    }

    #[test]
    fn tuples_crop_and_pad() {
        let v = ArrayValue::from_tuples(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]], 2);
        assert_eq!(v, ArrayValue::Float(vec![1.0, 2.0, 4.0, 5.0]));
        assert_eq!(v.to_tuples(2).unwrap(), vec![[1.0, 2.0, 0.0], [4.0, 5.0, 0.0]]);

        let rgba = ArrayValue::Double(vec![0.1, 0.2, 0.3, 0.4]);
        let rgb = rgba.to_tuples(4).unwrap();
        assert_eq!(rgb.len(), 1);
        assert!((rgb[0][2] - 0.3).abs() < 1e-6);

        assert!(ArrayValue::Bool(vec![true]).to_tuples(1).is_none());
    }
}
