use super::position::LineTrackingReader;
use super::report::{Diagnostic, Position};
use super::schema::{Content, ElementDecl, SchemaDefinition, TypeDef};
use super::types::SimpleType;
use super::FatalError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use std::io::BufRead;

const XSI_NAMESPACE: &[u8] = b"http://www.w3.org/2001/XMLSchema-instance";
const XML_NAMESPACE: &[u8] = b"http://www.w3.org/XML/1998/namespace";

/// An open element while streaming.
enum Frame<'s> {
    Checked(Checked<'s>),
    /// Not matched to a declaration. Descendants are skipped, and reported as
    /// warnings when `warn` is set (everything below an undeclared root).
    Unchecked { name: String, warn: bool },
}

struct Checked<'s> {
    name: String,
    ty: &'s TypeDef,
    particle: usize,
    occurs: u32,
    text: String,
    has_child_elements: bool,
    reported_text: bool,
}

impl<'s> Checked<'s> {
    fn new(name: String, ty: &'s TypeDef) -> Self {
        Self {
            name,
            ty,
            particle: 0,
            occurs: 0,
            text: String::new(),
            has_child_elements: false,
            reported_text: false,
        }
    }

    fn particles(&self) -> Option<&'s [ElementDecl]> {
        match self.ty {
            TypeDef::Complex(ct) => match &ct.content {
                Content::Elements(particles) => Some(particles),
                _ => None,
            },
            _ => None,
        }
    }

    /// Simple type of the character content, when it has to be checked.
    fn text_type(&self) -> Option<SimpleType> {
        match self.ty {
            TypeDef::Simple(ty) => Some(*ty),
            TypeDef::Complex(ct) => match ct.content {
                Content::Text(ty) => Some(ty),
                _ => None,
            },
            TypeDef::Any => None,
        }
    }

    fn allows_text(&self) -> bool {
        match self.ty {
            TypeDef::Any | TypeDef::Simple(_) => true,
            TypeDef::Complex(ct) => ct.mixed || matches!(ct.content, Content::Text(_)),
        }
    }
}

enum ChildMatch<'s> {
    Accepted(&'s ElementDecl),
    /// Out of order, but declared later in the sequence; validation resumes there.
    Resynced(&'s ElementDecl, Vec<&'s str>),
    Rejected(Vec<&'s str>),
}

/// Names that may legally come next in a sequence.
fn expected_names(particles: &[ElementDecl], cursor: usize, occurs: u32) -> Vec<&str> {
    let mut names = Vec::new();
    for (i, particle) in particles.iter().enumerate().skip(cursor) {
        let used = if i == cursor { occurs } else { 0 };
        if particle.max_occurs.allows(used + 1) {
            names.push(particle.name.as_str());
        }
        if used < particle.min_occurs {
            break;
        }
    }
    names
}

fn is_complete(particles: &[ElementDecl], cursor: usize, occurs: u32) -> bool {
    particles
        .iter()
        .enumerate()
        .skip(cursor)
        .all(|(i, particle)| {
            let used = if i == cursor { occurs } else { 0 };
            used >= particle.min_occurs
        })
}

fn match_child<'s>(
    particles: &'s [ElementDecl],
    cursor: &mut usize,
    occurs: &mut u32,
    name: &str,
) -> ChildMatch<'s> {
    let mut index = *cursor;
    let mut used = *occurs;
    while let Some(particle) = particles.get(index) {
        if particle.name == name && particle.max_occurs.allows(used + 1) {
            *cursor = index;
            *occurs = used + 1;
            return ChildMatch::Accepted(particle);
        }
        if used < particle.min_occurs {
            break;
        }
        index += 1;
        used = 0;
    }

    let expected = expected_names(particles, *cursor, *occurs);
    let resync = particles
        .iter()
        .enumerate()
        .skip(*cursor + 1)
        .find(|(_, particle)| particle.name == name);
    match resync {
        Some((index, particle)) => {
            *cursor = index;
            *occurs = 1;
            ChildMatch::Resynced(particle, expected)
        }
        None => ChildMatch::Rejected(expected),
    }
}

fn with_expected(message: String, expected: &[&str]) -> String {
    if expected.is_empty() {
        message
    } else {
        format!(
            "{message} List of possible elements expected: '{}'.",
            expected.join(", ")
        )
    }
}

fn markup(message: impl Into<String>) -> FatalError {
    FatalError::Markup(message.into())
}

/// Name matched against the schema. Declarations carry no target namespace,
/// so a name bound to any namespace becomes `namespace:local` and can never
/// match one.
fn schema_name(resolved: &ResolveResult<'_>, local: &[u8]) -> Result<String, FatalError> {
    let local = String::from_utf8_lossy(local);
    match resolved {
        ResolveResult::Unbound => Ok(local.into_owned()),
        ResolveResult::Bound(Namespace(ns)) if ns.is_empty() => Ok(local.into_owned()),
        ResolveResult::Bound(Namespace(ns)) => {
            Ok(format!("{}:{local}", String::from_utf8_lossy(ns)))
        }
        ResolveResult::Unknown(prefix) => Err(markup(format!(
            "'{}' is an undeclared prefix.",
            String::from_utf8_lossy(prefix)
        ))),
    }
}

/// Attributes to check, as (schema name, unescaped value). Namespace
/// declarations and `xsi:`/`xml:` attributes are left out.
fn read_attributes<R>(
    element: &BytesStart<'_>,
    reader: &NsReader<R>,
) -> Result<Vec<(String, String)>, FatalError> {
    let mut attributes = Vec::new();
    for attr in element.attributes() {
        let attr = attr.map_err(|e| markup(e.to_string()))?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let (resolved, local) = reader.resolve_attribute(attr.key);
        if let ResolveResult::Bound(Namespace(ns)) = resolved {
            if ns == XSI_NAMESPACE || ns == XML_NAMESPACE {
                continue;
            }
        }
        let name = schema_name(&resolved, local.as_ref())?;
        let value = attr
            .unescape_value()
            .map_err(|e| markup(e.to_string()))?
            .into_owned();
        attributes.push((name, value));
    }
    Ok(attributes)
}

/// Schema name and checked attributes of a start tag.
fn element_parts<R>(
    reader: &NsReader<R>,
    element: &BytesStart<'_>,
) -> Result<(String, Vec<(String, String)>), FatalError> {
    let (resolved, local) = reader.resolve_element(element.name());
    let name = schema_name(&resolved, local.as_ref())?;
    Ok((name, read_attributes(element, reader)?))
}

/// Validates one document stream against a compiled schema, pushing
/// diagnostics as they are found. Only the open-element stack is kept.
struct StreamValidator<'s, 'd> {
    schema: &'s SchemaDefinition,
    stack: Vec<Frame<'s>>,
    diagnostics: &'d mut Vec<Diagnostic>,
    seen_root: bool,
}

impl<'s, 'd> StreamValidator<'s, 'd> {
    fn new(schema: &'s SchemaDefinition, diagnostics: &'d mut Vec<Diagnostic>) -> Self {
        Self {
            schema,
            stack: Vec::new(),
            diagnostics,
            seen_root: false,
        }
    }

    fn error(&mut self, message: String, at: Position) {
        self.diagnostics.push(Diagnostic::error(message, Some(at)));
    }

    fn warning(&mut self, message: String, at: Position) {
        self.diagnostics.push(Diagnostic::warning(message, Some(at)));
    }

    fn start(
        &mut self,
        name: String,
        attributes: Vec<(String, String)>,
        at: Position,
    ) -> Result<(), FatalError> {
        let decl = match self.stack.last_mut() {
            None => {
                if self.seen_root {
                    return Err(markup("There are multiple root elements."));
                }
                self.seen_root = true;
                let decl = self.schema.root(&name);
                if decl.is_none() {
                    self.error(format!("The '{name}' element is not declared."), at);
                }
                decl.ok_or(true)
            }
            Some(Frame::Unchecked { warn, .. }) => {
                let warn = *warn;
                if warn {
                    self.warning(
                        format!("Could not find schema information for the element '{name}'."),
                        at,
                    );
                }
                Err(warn)
            }
            Some(Frame::Checked(parent)) => {
                parent.has_child_elements = true;
                let parent_name = parent.name.clone();
                let ty: &'s TypeDef = parent.ty;
                let placement = match ty {
                    TypeDef::Any => Err(None),
                    TypeDef::Simple(_) => Err(Some("text only")),
                    TypeDef::Complex(ct) => match &ct.content {
                        Content::Empty => Err(Some("empty")),
                        Content::Text(_) => Err(Some("text only")),
                        Content::Elements(particles) => Ok(match_child(
                            particles,
                            &mut parent.particle,
                            &mut parent.occurs,
                            &name,
                        )),
                    },
                };
                match placement {
                    Ok(ChildMatch::Accepted(decl)) => Ok(decl),
                    Ok(ChildMatch::Resynced(decl, expected)) => {
                        let message = format!(
                            "The element '{parent_name}' has invalid child element '{name}'."
                        );
                        self.error(with_expected(message, &expected), at);
                        Ok(decl)
                    }
                    Ok(ChildMatch::Rejected(expected)) => {
                        let message = format!(
                            "The element '{parent_name}' has invalid child element '{name}'."
                        );
                        self.error(with_expected(message, &expected), at);
                        Err(false)
                    }
                    Err(Some(model)) => {
                        self.error(
                            format!(
                                "The element '{parent_name}' cannot contain child element '{name}' because the parent element's content model is {model}."
                            ),
                            at,
                        );
                        Err(false)
                    }
                    Err(None) => Err(false),
                }
            }
        };

        match decl {
            Ok(decl) => {
                self.check_attributes(&decl.ty, &attributes, at);
                self.stack.push(Frame::Checked(Checked::new(name, &decl.ty)));
            }
            Err(warn) => {
                if warn {
                    for (attr, _) in &attributes {
                        self.warning(
                            format!("Could not find schema information for the attribute '{attr}'."),
                            at,
                        );
                    }
                }
                self.stack.push(Frame::Unchecked { name, warn });
            }
        }
        Ok(())
    }

    fn check_attributes(&mut self, ty: &TypeDef, attributes: &[(String, String)], at: Position) {
        let declared = match ty {
            TypeDef::Any => return,
            TypeDef::Simple(_) => &[][..],
            TypeDef::Complex(ct) => ct.attributes.as_slice(),
        };
        for (name, value) in attributes {
            match declared.iter().find(|d| d.name == *name) {
                None => self.error(format!("The '{name}' attribute is not declared."), at),
                Some(decl) if !decl.ty.accepts(value) => self.error(
                    format!(
                        "The '{name}' attribute is invalid - The value '{value}' is invalid according to its datatype '{}'.",
                        decl.ty.name()
                    ),
                    at,
                ),
                Some(_) => {}
            }
        }
        for decl in declared.iter().filter(|d| d.required) {
            if !attributes.iter().any(|(name, _)| *name == decl.name) {
                self.error(
                    format!("The required attribute '{}' is missing.", decl.name),
                    at,
                );
            }
        }
    }

    fn text(&mut self, text: &str, at: Position) -> Result<(), FatalError> {
        let frame = match self.stack.last_mut() {
            None if text.trim().is_empty() => return Ok(()),
            None => return Err(markup("Data at the root level is invalid.")),
            Some(Frame::Unchecked { .. }) => return Ok(()),
            Some(Frame::Checked(frame)) => frame,
        };
        if frame.allows_text() {
            if frame.text_type().is_some() {
                frame.text.push_str(text);
            }
            return Ok(());
        }
        if frame.reported_text || text.trim().is_empty() {
            return Ok(());
        }
        frame.reported_text = true;
        let message = format!("The element '{}' cannot contain text.", frame.name);
        let message = match frame.particles() {
            Some(particles) => {
                with_expected(message, &expected_names(particles, frame.particle, frame.occurs))
            }
            None => message,
        };
        self.error(message, at);
        Ok(())
    }

    fn end(&mut self, at: Position) -> Result<(), FatalError> {
        let frame = match self.stack.pop() {
            Some(Frame::Checked(frame)) => frame,
            Some(Frame::Unchecked { .. }) => return Ok(()),
            None => return Err(markup("Unexpected end tag.")),
        };
        if let Some(particles) = frame.particles() {
            if !is_complete(particles, frame.particle, frame.occurs) {
                let message = format!("The element '{}' has incomplete content.", frame.name);
                let expected = expected_names(particles, frame.particle, frame.occurs);
                self.error(with_expected(message, &expected), at);
            }
        } else if let Some(ty) = frame.text_type() {
            if !frame.has_child_elements && !ty.accepts(&frame.text) {
                self.error(
                    format!(
                        "The '{}' element is invalid - The value '{}' is invalid according to its datatype '{}'.",
                        frame.name,
                        frame.text.trim(),
                        ty.name()
                    ),
                    at,
                );
            }
        }
        Ok(())
    }

    fn finish(&self) -> Result<(), FatalError> {
        if !self.stack.is_empty() {
            let open: Vec<&str> = self
                .stack
                .iter()
                .map(|frame| match frame {
                    Frame::Checked(c) => c.name.as_str(),
                    Frame::Unchecked { name, .. } => name.as_str(),
                })
                .collect();
            return Err(markup(format!(
                "Unexpected end of file has occurred. The following elements are not closed: {}.",
                open.join(", ")
            )));
        }
        if !self.seen_root {
            return Err(markup("Root element is missing."));
        }
        Ok(())
    }
}

/// Streams `input` token by token against `schema`.
///
/// Diagnostics are appended to `diagnostics` as they are met; an `Err` means
/// the stream could not be read to its end.
pub(crate) fn validate_stream<R: BufRead>(
    schema: &SchemaDefinition,
    input: R,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<(), FatalError> {
    let mut reader = NsReader::from_reader(LineTrackingReader::new(input));
    reader
        .trim_text(false)
        .expand_empty_elements(false)
        .check_end_names(true);

    let mut validator = StreamValidator::new(schema, diagnostics);
    let mut buf = Vec::new();
    loop {
        let start = reader.buffer_position();
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(err) => {
                let at = reader.get_ref().locate(reader.buffer_position());
                return Err(markup(format!(
                    "{err} (near line {}, pos {})",
                    at.line, at.column
                )));
            }
        };
        let locate = |offset: usize| reader.get_ref().locate(offset);

        match event {
            Event::Start(element) => {
                let (name, attributes) = element_parts(&reader, &element)?;
                validator.start(name, attributes, locate(start + 1))?;
            }
            Event::Empty(element) => {
                let (name, attributes) = element_parts(&reader, &element)?;
                let at = locate(start + 1);
                validator.start(name, attributes, at)?;
                validator.end(at)?;
            }
            Event::End(_) => validator.end(locate(start + 2))?,
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| markup(e.to_string()))?;
                let leading = text.len() - text.trim_start().len();
                validator.text(&text, locate(start + leading))?;
            }
            Event::CData(cdata) => {
                let raw = cdata.into_inner();
                // skip the "<![CDATA[" opener
                validator.text(&String::from_utf8_lossy(&raw), locate(start + 9))?;
            }
            Event::DocType(_) => {
                return Err(markup("DTD is prohibited in this document."));
            }
            Event::Eof => return validator.finish(),
            Event::Decl(_) | Event::PI(_) | Event::Comment(_) => {}
        }

        reader.get_mut().forget_before(start);
        buf.clear();
    }
}
