use super::error::ShaderError;
use super::types::{GlslType, array_stride, round_up};

/// Qualifiers that may precede `in` and are irrelevant to buffer layout.
const INTERPOLATION: [&str; 7] = ["flat", "smooth", "noperspective", "centroid", "highp", "mediump", "lowp"];

/// One vertex/instance input, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDesc {
    pub name: String,
    pub ty: GlslType,
    pub components: u32,
    /// Square matrix: occupies `components` consecutive locations.
    pub square: bool,
    pub location: u32,
}

impl AttributeDesc {
    /// Number of attribute locations consumed.
    #[inline]
    pub fn slots(&self) -> u32 {
        if self.square { self.components } else { 1 }
    }
}

/// A loose (non-block) uniform such as a texture or sampler.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformDesc {
    pub name: String,
    pub ty: GlslType,
    pub set: u32,
    pub binding: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberType {
    Builtin(GlslType),
    Struct(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockMember {
    pub name: String,
    pub ty: MemberType,
    pub array_len: Option<u32>,
    /// std140 byte offset inside the block.
    pub offset: u32,
    /// Element stride for arrays, element size otherwise.
    pub stride: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UniformBlockDesc {
    pub name: String,
    pub set: u32,
    pub binding: u32,
    pub members: Vec<BlockMember>,
    /// std140 size of the whole block.
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldLayout {
    pub name: String,
    pub ty: GlslType,
    pub offset: u32,
}

/// std140 layout of a `struct` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct StructLayout {
    pub name: String,
    pub fields: Vec<FieldLayout>,
    /// Size rounded up to 16, i.e. the array stride of this struct.
    pub size: u32,
}

impl StructLayout {
    pub fn field(&self, name: &str) -> Option<&FieldLayout> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A uniform block holding a single array of structs: one entry per batch group.
#[derive(Debug, Copy, Clone)]
pub struct GroupTable<'a> {
    pub element: &'a StructLayout,
    pub stride: u32,
    pub len: u32,
}

/// Attribute and uniform layout of a shader program, reconstructed from its
/// source text.
///
/// Built once at load time and treated as immutable configuration afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeDescriptor {
    name: String,
    attributes: Vec<AttributeDesc>,
    uniforms: Vec<UniformDesc>,
    blocks: Vec<UniformBlockDesc>,
    structs: Vec<StructLayout>,
}

impl ShapeDescriptor {
    /// Scans one shader stage line by line.
    pub fn parse(name: &str, source: &str) -> Result<Self, ShaderError> {
        Parser::new(name).run(source)
    }

    /// Parses a vertex/fragment pair. Attributes come from the vertex stage only
    /// (fragment `in`s are varyings); uniforms, blocks and structs are merged.
    pub fn parse_program(name: &str, vertex: &str, fragment: &str) -> Result<Self, ShaderError> {
        let mut desc = Self::parse(name, vertex)?;
        let frag = Self::parse(name, fragment)?;

        for s in frag.structs {
            if !desc.structs.iter().any(|d| d.name == s.name) {
                desc.structs.push(s);
            }
        }
        for u in frag.uniforms {
            match desc.uniforms.iter().find(|d| d.name == u.name) {
                Some(d) if d.set != u.set || d.binding != u.binding => {
                    return Err(ShaderError::ConflictingUniform { shader: name.to_owned(), name: u.name });
                }
                Some(_) => {}
                None => desc.uniforms.push(u),
            }
        }
        for b in frag.blocks {
            match desc.blocks.iter().find(|d| d.name == b.name) {
                Some(d) if d.set != b.set || d.binding != b.binding || d.size != b.size => {
                    return Err(ShaderError::ConflictingUniform { shader: name.to_owned(), name: b.name });
                }
                Some(_) => {}
                None => desc.blocks.push(b),
            }
        }

        log::debug!(
            "shader `{name}`: {} attributes, {} uniforms, {} uniform blocks",
            desc.attributes.len(),
            desc.uniforms.len(),
            desc.blocks.len()
        );
        Ok(desc)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &[AttributeDesc] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDesc> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn uniforms(&self) -> &[UniformDesc] {
        &self.uniforms
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformDesc> {
        self.uniforms.iter().find(|u| u.name == name)
    }

    pub fn uniform_blocks(&self) -> &[UniformBlockDesc] {
        &self.blocks
    }

    pub fn uniform_block(&self, name: &str) -> Option<&UniformBlockDesc> {
        self.blocks.iter().find(|b| b.name == name)
    }

    pub fn struct_layout(&self, name: &str) -> Option<&StructLayout> {
        self.structs.iter().find(|s| s.name == name)
    }

    /// Returns the element layout and length of a block shaped like
    /// `uniform Groups { Group groups[N]; }`.
    pub fn group_table(&self, block: &str) -> Option<GroupTable<'_>> {
        let block = self.uniform_block(block)?;
        let [member] = block.members.as_slice() else { return None };
        let MemberType::Struct(element) = &member.ty else { return None };
        Some(GroupTable {
            element: self.struct_layout(element)?,
            stride: member.stride,
            len: member.array_len?,
        })
    }
}

// ── parser ────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Qualifiers {
    location: Option<u32>,
    binding: Option<u32>,
    set: Option<u32>,
}

struct PendingBlock {
    name: String,
    set: u32,
    binding: Option<u32>,
    members: Vec<(MemberType, String, Option<u32>)>,
    line: usize,
}

struct PendingStruct {
    name: String,
    fields: Vec<(GlslType, String)>,
    line: usize,
}

enum Scope {
    Top,
    Block(PendingBlock),
    Struct(PendingStruct),
}

struct Parser<'a> {
    shader: &'a str,
    desc: ShapeDescriptor,
    scope: Scope,
    next_location: u32,
}

impl<'a> Parser<'a> {
    fn new(shader: &'a str) -> Self {
        Self {
            shader,
            desc: ShapeDescriptor { name: shader.to_owned(), ..ShapeDescriptor::default() },
            scope: Scope::Top,
            next_location: 0,
        }
    }

    fn run(mut self, source: &str) -> Result<ShapeDescriptor, ShaderError> {
        for (idx, raw) in source.lines().enumerate() {
            self.line(idx + 1, raw)?;
        }
        match std::mem::replace(&mut self.scope, Scope::Top) {
            Scope::Top => Ok(self.desc),
            Scope::Block(b) => Err(self.unterminated(b.line, b.name)),
            Scope::Struct(s) => Err(self.unterminated(s.line, s.name)),
        }
    }

    fn line(&mut self, line: usize, raw: &str) -> Result<(), ShaderError> {
        let (code, comment) = raw.split_once("//").unwrap_or((raw, ""));
        let code = code.trim();
        if code.is_empty() || code.starts_with('#') {
            return Ok(());
        }
        let (q, rest) = self.layout_prefix(line, code)?;

        match std::mem::replace(&mut self.scope, Scope::Top) {
            Scope::Top => self.top_level(line, &q, rest, comment),
            Scope::Block(block) => self.block_body(line, block, rest, comment),
            Scope::Struct(pending) => self.struct_body(line, pending, rest),
        }
    }

    fn top_level(&mut self, line: usize, q: &Qualifiers, code: &str, comment: &str) -> Result<(), ShaderError> {
        let stmt = code.trim_end_matches(';').trim();
        let tokens: Vec<&str> = stmt
            .split_whitespace()
            .filter(|t| !INTERPOLATION.contains(t))
            .collect();

        match tokens.as_slice() {
            ["struct", ..] => self.open_struct(line, code),
            ["in", ty, name] => self.attribute(line, q, ty, name),
            ["in", ..] => Err(self.malformed(line, code)),
            ["uniform", ..] if code.contains('{') => self.open_block(line, q, code, comment),
            ["uniform", ty, name] => self.uniform(line, q, comment, ty, name),
            ["uniform", ..] => Err(self.malformed(line, code)),
            // Outputs, functions, constants: not part of the binding layout.
            _ => Ok(()),
        }
    }

    fn attribute(&mut self, line: usize, q: &Qualifiers, ty: &str, name: &str) -> Result<(), ShaderError> {
        let ty = self.builtin(line, ty)?;
        if ty.is_opaque() || !is_ident(name) {
            return Err(self.malformed(line, name));
        }
        let square = ty.is_matrix();
        let location = q.location.unwrap_or(self.next_location);
        let attr = AttributeDesc {
            name: name.to_owned(),
            ty,
            components: ty.components(),
            square,
            location,
        };
        self.next_location = location + attr.slots();
        log::trace!("{}:{line}: attribute {} {} @{location}", self.shader, ty.keyword(), name);
        self.desc.attributes.push(attr);
        Ok(())
    }

    fn uniform(
        &mut self,
        line: usize,
        q: &Qualifiers,
        comment: &str,
        ty: &str,
        decl: &str,
    ) -> Result<(), ShaderError> {
        let ty = self.builtin(line, ty)?;
        let binding = match q.binding {
            Some(b) => Some(b),
            None => self.binding_annotation(line, "", comment)?,
        };
        let set = q.set.unwrap_or(0);
        let (base, len) = self.array_decl(line, decl)?;

        let entries: Vec<(String, Option<u32>)> = match len {
            None => vec![(base.to_owned(), binding)],
            Some(n) => (0..n).map(|i| (format!("{base}[{i}]"), binding.map(|b| b + i))).collect(),
        };
        for (name, binding) in entries {
            if self.desc.uniforms.iter().any(|u| u.name == name) {
                return Err(ShaderError::ConflictingUniform { shader: self.shader.to_owned(), name });
            }
            self.desc.uniforms.push(UniformDesc { name, ty, set, binding });
        }
        Ok(())
    }

    fn open_struct(&mut self, line: usize, code: &str) -> Result<(), ShaderError> {
        let Some(brace) = code.find('{') else { return Err(self.malformed(line, code)) };
        let name = code[..brace].trim().trim_start_matches("struct").trim();
        if !is_ident(name) {
            return Err(self.malformed(line, code));
        }
        let pending = PendingStruct { name: name.to_owned(), fields: Vec::new(), line };
        self.struct_body(line, pending, &code[brace + 1..])
    }

    fn struct_body(&mut self, line: usize, mut pending: PendingStruct, text: &str) -> Result<(), ShaderError> {
        let (body, closed) = match text.find('}') {
            Some(close) => (&text[..close], true),
            None => (text, false),
        };
        for decl in declarations(body) {
            let [ty, name] = decl.as_slice() else { return Err(self.malformed(line, body.trim())) };
            let ty = self.builtin(line, ty)?;
            if ty.is_opaque() || !is_ident(name) {
                return Err(self.malformed(line, body.trim()));
            }
            pending.fields.push((ty, (*name).to_owned()));
        }

        if !closed {
            self.scope = Scope::Struct(pending);
            return Ok(());
        }

        let mut cursor = 0;
        let mut fields = Vec::with_capacity(pending.fields.len());
        for (ty, name) in pending.fields {
            // Opaque types were rejected above.
            let Some(layout) = ty.std140() else { continue };
            let offset = round_up(cursor, layout.align);
            cursor = offset + layout.size;
            fields.push(FieldLayout { name, ty, offset });
        }
        self.desc.structs.push(StructLayout {
            name: pending.name,
            fields,
            size: round_up(cursor, 16),
        });
        Ok(())
    }

    fn open_block(&mut self, line: usize, q: &Qualifiers, code: &str, comment: &str) -> Result<(), ShaderError> {
        let Some(brace) = code.find('{') else { return Err(self.malformed(line, code)) };
        let name = code[..brace].trim().trim_start_matches("uniform").trim();
        if !is_ident(name) {
            return Err(self.malformed(line, code));
        }
        let binding = match q.binding {
            Some(b) => Some(b),
            None => self.binding_annotation(line, "", comment)?,
        };
        let pending = PendingBlock {
            name: name.to_owned(),
            set: q.set.unwrap_or(0),
            binding,
            members: Vec::new(),
            line,
        };
        self.block_body(line, pending, &code[brace + 1..], comment)
    }

    fn block_body(
        &mut self,
        line: usize,
        mut pending: PendingBlock,
        text: &str,
        comment: &str,
    ) -> Result<(), ShaderError> {
        let (body, tail) = match text.find('}') {
            Some(close) => (&text[..close], Some(&text[close + 1..])),
            None => (text, None),
        };

        for decl in declarations(body) {
            let [ty, decl_name] = decl.as_slice() else { return Err(self.malformed(line, body.trim())) };
            let member_ty = match GlslType::from_token(ty) {
                Some(t) if t.is_opaque() => return Err(self.malformed(line, body.trim())),
                Some(t) => MemberType::Builtin(t),
                None if self.desc.struct_layout(ty).is_some() => MemberType::Struct((*ty).to_owned()),
                None => return Err(self.unknown_type(line, ty)),
            };
            let (name, len) = self.array_decl(line, decl_name)?;
            pending.members.push((member_ty, name.to_owned(), len));
        }

        let Some(tail) = tail else {
            self.scope = Scope::Block(pending);
            return Ok(());
        };

        let binding = match pending.binding {
            Some(b) => b,
            None => match self.binding_annotation(line, tail, comment)? {
                Some(b) => b,
                None => {
                    return Err(ShaderError::MissingBinding {
                        shader: self.shader.to_owned(),
                        line: pending.line,
                        block: pending.name,
                    });
                }
            },
        };
        self.finish_block(pending, binding)
    }

    fn finish_block(&mut self, pending: PendingBlock, binding: u32) -> Result<(), ShaderError> {
        if self.desc.blocks.iter().any(|b| b.name == pending.name) {
            return Err(ShaderError::ConflictingUniform { shader: self.shader.to_owned(), name: pending.name });
        }

        let mut cursor = 0;
        let mut members = Vec::with_capacity(pending.members.len());
        for (ty, name, len) in pending.members {
            let (size, align) = match &ty {
                MemberType::Builtin(t) => match t.std140() {
                    Some(l) => (l.size, l.align),
                    None => continue,
                },
                MemberType::Struct(s) => match self.desc.struct_layout(s) {
                    Some(l) => (l.size, 16),
                    None => continue,
                },
            };
            let (align, total, stride) = match len {
                Some(n) => {
                    let stride = array_stride(size);
                    (align.max(16), stride * n, stride)
                }
                None => (align, size, size),
            };
            let offset = round_up(cursor, align);
            cursor = offset + total;
            members.push(BlockMember { name, ty, array_len: len, offset, stride });
        }

        log::trace!("{}: uniform block {} @binding {binding}", self.shader, pending.name);
        self.desc.blocks.push(UniformBlockDesc {
            name: pending.name,
            set: pending.set,
            binding,
            members,
            size: round_up(cursor, 16),
        });
        Ok(())
    }

    // ── token helpers ──────────────────────────────────────────────────────

    fn layout_prefix<'l>(&self, line: usize, code: &'l str) -> Result<(Qualifiers, &'l str), ShaderError> {
        let mut q = Qualifiers::default();
        let Some(rest) = code.strip_prefix("layout") else { return Ok((q, code)) };
        let Some(inner) = rest.trim_start().strip_prefix('(') else { return Ok((q, code)) };
        let Some(close) = inner.find(')') else { return Err(self.malformed(line, code)) };

        for item in inner[..close].split(',') {
            // Bare qualifiers such as `std140` carry no value.
            let Some((key, value)) = item.split_once('=') else { continue };
            let value: u32 = value.trim().parse().map_err(|_| self.malformed(line, code))?;
            match key.trim() {
                "location" => q.location = Some(value),
                "binding" => q.binding = Some(value),
                "set" => q.set = Some(value),
                _ => {}
            }
        }
        Ok((q, inner[close + 1..].trim_start()))
    }

    /// Looks for `binding = N` in `code`, then in `comment`.
    fn binding_annotation(&self, line: usize, code: &str, comment: &str) -> Result<Option<u32>, ShaderError> {
        for text in [code, comment] {
            let Some(at) = text.find("binding") else { continue };
            let rest = text[at + "binding".len()..].trim_start();
            let digits: String = rest
                .strip_prefix('=')
                .unwrap_or("")
                .trim_start()
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            return match digits.parse() {
                Ok(b) => Ok(Some(b)),
                Err(_) => Err(self.malformed(line, text.trim())),
            };
        }
        Ok(None)
    }

    /// Splits `name[N]` into `("name", Some(N))`.
    fn array_decl<'d>(&self, line: usize, decl: &'d str) -> Result<(&'d str, Option<u32>), ShaderError> {
        let Some(open) = decl.find('[') else {
            return if is_ident(decl) { Ok((decl, None)) } else { Err(self.malformed(line, decl)) };
        };
        let base = &decl[..open];
        let bound = decl[open + 1..]
            .strip_suffix(']')
            .and_then(|inner| inner.trim().parse::<u32>().ok())
            .filter(|&n| n > 0);
        match bound {
            Some(n) if is_ident(base) => Ok((base, Some(n))),
            _ => Err(ShaderError::MalformedArray {
                shader: self.shader.to_owned(),
                line,
                decl: decl.to_owned(),
            }),
        }
    }

    fn builtin(&self, line: usize, token: &str) -> Result<GlslType, ShaderError> {
        GlslType::from_token(token).ok_or_else(|| self.unknown_type(line, token))
    }

    fn unknown_type(&self, line: usize, token: &str) -> ShaderError {
        ShaderError::UnknownType { shader: self.shader.to_owned(), line, token: token.to_owned() }
    }

    fn malformed(&self, line: usize, decl: &str) -> ShaderError {
        ShaderError::Malformed { shader: self.shader.to_owned(), line, decl: decl.to_owned() }
    }

    fn unterminated(&self, line: usize, name: String) -> ShaderError {
        ShaderError::Unterminated { shader: self.shader.to_owned(), line, name }
    }
}

/// Splits a block/struct body into `;`-terminated declarations, tokenised.
fn declarations(body: &str) -> impl Iterator<Item = Vec<&str>> {
    body.split(';')
        .map(|d| d.split_whitespace().collect::<Vec<_>>())
        .filter(|tokens| !tokens.is_empty())
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> ShapeDescriptor {
        ShapeDescriptor::parse("test.vert", src).unwrap()
    }

    fn parse_err(src: &str) -> ShaderError {
        ShapeDescriptor::parse("test.vert", src).unwrap_err()
    }

    // ── attributes ────────────────────────────────────────────────────────

    #[test]
    fn attribute_component_counts_in_declaration_order() {
        let d = parse("in vec2 position;\nin mat3 transform;\nin int dataIndex;\n");
        let counts: Vec<u32> = d.attributes().iter().map(|a| a.components).collect();
        assert_eq!(counts, [2, 3, 1]);
        assert!(d.uniform_blocks().is_empty());
        assert!(d.attribute("transform").unwrap().square);
        assert!(!d.attribute("position").unwrap().square);
    }

    #[test]
    fn matrices_consume_consecutive_locations() {
        let d = parse("in vec2 position;\nin mat3 transform;\nin int dataIndex;\n");
        let locations: Vec<u32> = d.attributes().iter().map(|a| a.location).collect();
        assert_eq!(locations, [0, 1, 4]);
    }

    #[test]
    fn explicit_locations_and_interpolation_qualifiers() {
        let d = parse(
            "layout(location = 3) in vec4 color;\n\
             layout(location = 7) flat in int dataIndex;\n\
             in float depth;\n",
        );
        assert_eq!(d.attribute("color").unwrap().location, 3);
        assert_eq!(d.attribute("dataIndex").unwrap().location, 7);
        assert_eq!(d.attribute("depth").unwrap().location, 8);
    }

    #[test]
    fn comments_and_code_are_ignored() {
        let d = parse(
            "#version 450\n\
             // in vec2 commented;\n\
             layout(location = 0) out vec4 vColor;\n\
             void main() {\n\
                 vec2 p = vec2(0.0);\n\
             }\n",
        );
        assert!(d.attributes().is_empty());
        assert!(d.uniforms().is_empty());
    }

    // ── uniform blocks ────────────────────────────────────────────────────

    #[test]
    fn block_binding_from_closing_comment() {
        let d = parse("uniform FontData {\n    vec4 glyphRects[4];\n} // binding = 2\n");
        let block = d.uniform_block("FontData").unwrap();
        assert_eq!(block.binding, 2);
        assert_eq!(block.members[0].array_len, Some(4));
        assert_eq!(block.size, 64);
    }

    #[test]
    fn block_binding_from_layout_prefix() {
        let d = parse(
            "layout(std140, set = 1, binding = 4) uniform View {\n    mat3 viewTransform;\n};\n",
        );
        let block = d.uniform_block("View").unwrap();
        assert_eq!((block.set, block.binding), (1, 4));
        assert_eq!(block.size, 48);
    }

    #[test]
    fn single_line_block() {
        let d = parse("uniform View { mat3 viewTransform; vec4 tint; } binding = 0;\n");
        let block = d.uniform_block("View").unwrap();
        assert_eq!(block.binding, 0);
        assert_eq!(block.members.len(), 2);
        assert_eq!(block.members[1].offset, 48);
    }

    #[test]
    fn missing_binding_is_fatal() {
        let err = parse_err("uniform Data {\n    float x;\n}\n");
        assert!(matches!(err, ShaderError::MissingBinding { line: 1, ref block, .. } if block == "Data"));
    }

    #[test]
    fn unterminated_block() {
        let err = parse_err("layout(binding = 0) uniform Data {\n    float x;\n");
        assert!(matches!(err, ShaderError::Unterminated { line: 1, .. }));
    }

    #[test]
    fn unterminated_struct() {
        let err = parse_err("// groups\nstruct Group {\n    vec4 clip;\n");
        assert!(matches!(err, ShaderError::Unterminated { line: 2, ref name, .. } if name == "Group"));
    }

    // ── structs and group tables ──────────────────────────────────────────

    const TEXT_GROUPS: &str = "\
struct TextGroup {
    vec4 clip;
    vec4 color;
    mat3 transform;
    float scale;
};

layout(std140, set = 0, binding = 1) uniform TextGroups {
    TextGroup groups[256];
};
";

    #[test]
    fn struct_fields_follow_std140() {
        let d = parse(TEXT_GROUPS);
        let s = d.struct_layout("TextGroup").unwrap();
        let offsets: Vec<u32> = s.fields.iter().map(|f| f.offset).collect();
        assert_eq!(offsets, [0, 16, 32, 80]);
        assert_eq!(s.size, 96);
    }

    #[test]
    fn group_table_reports_stride_and_length() {
        let d = parse(TEXT_GROUPS);
        let table = d.group_table("TextGroups").unwrap();
        assert_eq!(table.element.name, "TextGroup");
        assert_eq!(table.stride, 96);
        assert_eq!(table.len, 256);
        assert_eq!(d.uniform_block("TextGroups").unwrap().size, 96 * 256);
    }

    #[test]
    fn unknown_struct_member_type() {
        let err = parse_err("layout(binding = 1) uniform Groups {\n    Missing groups[4];\n};\n");
        assert!(matches!(err, ShaderError::UnknownType { line: 2, ref token, .. } if token == "Missing"));
    }

    // ── loose uniforms ────────────────────────────────────────────────────

    #[test]
    fn uniform_arrays_expand() {
        let d = parse("layout(set = 1, binding = 3) uniform texture2D images[3];\n");
        let names: Vec<&str> = d.uniforms().iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["images[0]", "images[1]", "images[2]"]);
        let bindings: Vec<Option<u32>> = d.uniforms().iter().map(|u| u.binding).collect();
        assert_eq!(bindings, [Some(3), Some(4), Some(5)]);
        assert!(d.uniforms().iter().all(|u| u.set == 1));
    }

    #[test]
    fn sampler_uniform() {
        let d = parse("layout(set = 1, binding = 8) uniform sampler imageSampler;\n");
        let u = d.uniform("imageSampler").unwrap();
        assert_eq!(u.ty, GlslType::Sampler);
        assert_eq!(u.binding, Some(8));
    }

    #[test]
    fn malformed_array_bound() {
        for src in [
            "uniform texture2D images[N];\n",
            "uniform texture2D images[0];\n",
            "uniform texture2D images[4;\n",
        ] {
            assert!(matches!(parse_err(src), ShaderError::MalformedArray { line: 1, .. }), "{src}");
        }
    }

    #[test]
    fn unknown_type_reports_line() {
        let err = parse_err("in vec2 position;\nin dvec2 wide;\n");
        assert_eq!(
            err,
            ShaderError::UnknownType {
                shader: "test.vert".into(),
                line: 2,
                token: "dvec2".into(),
            }
        );
    }

    // ── program merge ─────────────────────────────────────────────────────

    #[test]
    fn program_takes_attributes_from_vertex_stage_only() {
        let vert = "in vec2 corner;\nlayout(location = 0) out vec4 vColor;\n";
        let frag = "layout(location = 0) in vec4 vColor;\n\
                    layout(set = 1, binding = 0) uniform texture2D glyphAtlas;\n";
        let d = ShapeDescriptor::parse_program("prog", vert, frag).unwrap();
        assert_eq!(d.attributes().len(), 1);
        assert!(d.uniform("glyphAtlas").is_some());
    }

    #[test]
    fn program_rejects_conflicting_bindings() {
        let vert = "layout(set = 1, binding = 0) uniform sampler s;\n";
        let frag = "layout(set = 1, binding = 1) uniform sampler s;\n";
        let err = ShapeDescriptor::parse_program("prog", vert, frag).unwrap_err();
        assert!(matches!(err, ShaderError::ConflictingUniform { .. }));
    }
}
