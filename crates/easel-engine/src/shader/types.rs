//! GLSL type table and std140 layout rules.

/// GLSL types recognised in shader declarations.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum GlslType {
    Int,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
    Texture2D,
    Sampler,
}

/// Size and alignment of a type inside a std140 uniform block.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Std140 {
    pub size: u32,
    pub align: u32,
}

impl GlslType {
    /// Looks up a type keyword. Returns `None` for anything not in the table.
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "int" => Self::Int,
            "float" => Self::Float,
            "vec2" => Self::Vec2,
            "vec3" => Self::Vec3,
            "vec4" => Self::Vec4,
            "mat2" => Self::Mat2,
            "mat3" => Self::Mat3,
            "mat4" => Self::Mat4,
            "texture2D" => Self::Texture2D,
            "sampler" => Self::Sampler,
            _ => return None,
        })
    }

    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::Vec4 => "vec4",
            Self::Mat2 => "mat2",
            Self::Mat3 => "mat3",
            Self::Mat4 => "mat4",
            Self::Texture2D => "texture2D",
            Self::Sampler => "sampler",
        }
    }

    /// Component count. For matrices this is the row/column count (`mat3` = 3).
    pub const fn components(self) -> u32 {
        match self {
            Self::Int | Self::Float => 1,
            Self::Vec2 | Self::Mat2 => 2,
            Self::Vec3 | Self::Mat3 => 3,
            Self::Vec4 | Self::Mat4 => 4,
            Self::Texture2D | Self::Sampler => 0,
        }
    }

    /// Square matrices occupy `components` consecutive attribute slots.
    pub const fn is_matrix(self) -> bool {
        matches!(self, Self::Mat2 | Self::Mat3 | Self::Mat4)
    }

    /// Textures and samplers: bindable resources with no host-side byte layout.
    pub const fn is_opaque(self) -> bool {
        matches!(self, Self::Texture2D | Self::Sampler)
    }

    /// Bytes per instance in a tightly packed vertex buffer.
    pub const fn packed_size(self) -> u32 {
        let n = self.components();
        if self.is_matrix() { n * n * 4 } else { n * 4 }
    }

    /// std140 size/alignment. `None` for opaque types.
    pub const fn std140(self) -> Option<Std140> {
        let (size, align) = match self {
            Self::Int | Self::Float => (4, 4),
            Self::Vec2 => (8, 8),
            Self::Vec3 => (12, 16),
            Self::Vec4 => (16, 16),
            // Each column is padded to a vec4.
            Self::Mat2 => (32, 16),
            Self::Mat3 => (48, 16),
            Self::Mat4 => (64, 16),
            Self::Texture2D | Self::Sampler => return None,
        };
        Some(Std140 { size, align })
    }
}

/// Rounds `value` up to the next multiple of `to` (`to` > 0).
#[inline]
pub(crate) const fn round_up(value: u32, to: u32) -> u32 {
    value.div_ceil(to) * to
}

/// std140 stride of one array element of the given size.
#[inline]
pub(crate) const fn array_stride(element_size: u32) -> u32 {
    round_up(element_size, 16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_table() {
        let counts: Vec<u32> = ["float", "int", "vec2", "vec3", "vec4", "mat2", "mat3", "mat4"]
            .iter()
            .map(|t| GlslType::from_token(t).unwrap().components())
            .collect();
        assert_eq!(counts, [1, 1, 2, 3, 4, 2, 3, 4]);
    }

    #[test]
    fn matrices_are_square() {
        assert!(GlslType::Mat3.is_matrix());
        assert!(!GlslType::Vec3.is_matrix());
        assert_eq!(GlslType::Mat3.packed_size(), 36);
        assert_eq!(GlslType::Vec3.packed_size(), 12);
    }

    #[test]
    fn std140_pads_matrix_columns() {
        assert_eq!(GlslType::Mat3.std140(), Some(Std140 { size: 48, align: 16 }));
        assert_eq!(GlslType::Vec3.std140().unwrap().align, 16);
        assert_eq!(GlslType::Sampler.std140(), None);
    }

    #[test]
    fn unknown_token() {
        assert_eq!(GlslType::from_token("dvec2"), None);
        assert_eq!(GlslType::from_token("sampler2D"), None);
    }

    #[test]
    fn rounding() {
        assert_eq!(round_up(84, 16), 96);
        assert_eq!(round_up(96, 16), 96);
        assert_eq!(array_stride(4), 16);
    }
}
