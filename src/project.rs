//! Project-file persistence.
//!
//! The analyzer's GUI and CLI share an XML project format
//! (`<project version="1">`). The core reads and writes it for
//! interoperability: unknown elements are ignored, element order is not
//! significant, and a missing element means its default.
//!
//! The string-list and suppression readers terminate on the first
//! EndElement whose name differs from the child element name — i.e. the
//! parent's closing tag. That termination rule is part of the accepted
//! input surface and is kept as-is; see DESIGN.md.

use std::io::Cursor;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CcflowError, Result};

/// One suppressed diagnostic: an error id, optionally narrowed to a
/// file, line and symbol name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suppression {
    pub error_id: String,
    pub file_name: String,
    pub line_number: Option<u32>,
    pub symbol_name: String,
}

/// The persisted project configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub root_name: String,
    pub build_dir: String,
    pub platform: String,
    pub import_project: String,
    pub analyze_all_vs_configs: bool,
    pub check_headers: bool,
    pub check_unused_templates: bool,
    pub max_ctu_depth: i32,
    pub include_dirs: Vec<String>,
    pub defines: Vec<String>,
    pub undefines: Vec<String>,
    pub paths: Vec<String>,
    pub exclude_paths: Vec<String>,
    pub libraries: Vec<String>,
    pub suppressions: Vec<Suppression>,
    pub addons: Vec<String>,
    pub tools: Vec<String>,
    pub tags: Vec<String>,
    pub check_unknown_function_return: Vec<String>,
    pub check_all_function_parameter_values: bool,
}

impl Default for ProjectFile {
    fn default() -> Self {
        ProjectFile {
            root_name: String::new(),
            build_dir: String::new(),
            platform: String::new(),
            import_project: String::new(),
            analyze_all_vs_configs: true,
            check_headers: true,
            check_unused_templates: false,
            max_ctu_depth: 10,
            include_dirs: Vec::new(),
            defines: Vec::new(),
            undefines: Vec::new(),
            paths: Vec::new(),
            exclude_paths: Vec::new(),
            libraries: Vec::new(),
            suppressions: Vec::new(),
            addons: Vec::new(),
            tools: Vec::new(),
            tags: Vec::new(),
            check_unknown_function_return: Vec::new(),
            check_all_function_parameter_values: false,
        }
    }
}

impl ProjectFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to the cleared state. Unlike [`ProjectFile::default`] this
    /// leaves `analyze_all_vs_configs` off; reading starts from here.
    pub fn clear(&mut self) {
        *self = ProjectFile {
            analyze_all_vs_configs: false,
            ..ProjectFile::default()
        };
    }

    // ------------------------------------------------------------------
    // Reading
    // ------------------------------------------------------------------

    /// Read a project file from disk.
    ///
    /// # Errors
    ///
    /// I/O failures, malformed XML, and a document without a `<project>`
    /// root are errors.
    pub fn read(path: impl AsRef<Path>) -> Result<ProjectFile> {
        let content = std::fs::read_to_string(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "read project file");
        Self::read_from_str(&content)
    }

    /// Read a project file from an XML string.
    pub fn read_from_str(xml: &str) -> Result<ProjectFile> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut project = ProjectFile::new();
        project.clear();
        let mut inside_project = false;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = e.name().as_ref().to_vec();
                    if !inside_project {
                        if name == b"project" {
                            inside_project = true;
                            continue;
                        }
                        return Err(CcflowError::Config(
                            "project file has no <project> root element".to_string(),
                        ));
                    }
                    match name.as_slice() {
                        b"root" => project.root_name = attr_value(&e, "name")?,
                        b"builddir" => {
                            project.build_dir = reader.read_text(e.name())?.into_owned()
                        }
                        b"platform" => {
                            project.platform = reader.read_text(e.name())?.into_owned()
                        }
                        b"importproject" => {
                            project.import_project = reader.read_text(e.name())?.into_owned()
                        }
                        b"analyze-all-vs-configs" => {
                            project.analyze_all_vs_configs =
                                reader.read_text(e.name())? == "true";
                        }
                        b"check-headers" => {
                            project.check_headers = reader.read_text(e.name())? == "true";
                        }
                        b"check-unused-templates" => {
                            project.check_unused_templates =
                                reader.read_text(e.name())? == "true";
                        }
                        b"max-ctu-depth" => {
                            let text = reader.read_text(e.name())?;
                            project.max_ctu_depth =
                                text.trim().parse().unwrap_or(project.max_ctu_depth);
                        }
                        b"includedir" => {
                            read_string_list(&mut reader, &mut project.include_dirs, b"dir", Some("name"))?;
                        }
                        b"defines" => {
                            read_string_list(&mut reader, &mut project.defines, b"define", Some("name"))?;
                        }
                        b"undefines" => {
                            read_string_list(&mut reader, &mut project.undefines, b"undefine", None)?;
                        }
                        b"paths" => {
                            read_string_list(&mut reader, &mut project.paths, b"dir", Some("name"))?;
                        }
                        b"exclude" | b"ignore" => {
                            read_string_list(&mut reader, &mut project.exclude_paths, b"path", Some("name"))?;
                        }
                        b"libraries" => {
                            read_string_list(&mut reader, &mut project.libraries, b"library", None)?;
                        }
                        b"suppressions" => {
                            read_suppressions(&mut reader, &mut project.suppressions)?;
                        }
                        b"addons" => {
                            read_string_list(&mut reader, &mut project.addons, b"addon", None)?;
                        }
                        b"tools" => {
                            read_string_list(&mut reader, &mut project.tools, b"tool", None)?;
                        }
                        b"tags" => {
                            read_string_list(&mut reader, &mut project.tags, b"tag", None)?;
                        }
                        b"check-unknown-function-return-values" => {
                            read_string_list(
                                &mut reader,
                                &mut project.check_unknown_function_return,
                                b"name",
                                None,
                            )?;
                        }
                        b"check-all-function-parameter-values" => {
                            project.check_all_function_parameter_values = true;
                            reader.read_to_end(e.name())?;
                        }
                        _ => {
                            // Unknown element: skip its whole subtree.
                            reader.read_to_end(e.name())?;
                        }
                    }
                }
                Event::Empty(e) => {
                    let name = e.name().as_ref().to_vec();
                    if !inside_project {
                        if name == b"project" {
                            inside_project = true;
                            continue;
                        }
                        return Err(CcflowError::Config(
                            "project file has no <project> root element".to_string(),
                        ));
                    }
                    match name.as_slice() {
                        b"root" => project.root_name = attr_value(&e, "name")?,
                        b"check-all-function-parameter-values" => {
                            project.check_all_function_parameter_values = true;
                        }
                        _ => {}
                    }
                }
                Event::End(_) => {}
                Event::Eof => break,
                _ => {}
            }
        }

        if !inside_project {
            return Err(CcflowError::Config(
                "project file has no <project> root element".to_string(),
            ));
        }
        Ok(project)
    }

    // ------------------------------------------------------------------
    // Writing
    // ------------------------------------------------------------------

    /// Write the project file to disk, pretty-printed.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let xml = self.write_to_string()?;
        std::fs::write(path.as_ref(), xml)?;
        debug!(path = %path.as_ref().display(), "wrote project file");
        Ok(())
    }

    /// Render the project file as pretty-printed XML 1.0.
    pub fn write_to_string(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut start = BytesStart::new("project");
        start.push_attribute(("version", "1"));
        writer.write_event(Event::Start(start))?;

        let mut root = BytesStart::new("root");
        root.push_attribute(("name", self.root_name.as_str()));
        writer.write_event(Event::Empty(root))?;

        if !self.build_dir.is_empty() {
            write_text_element(&mut writer, "builddir", &self.build_dir)?;
        }
        if !self.platform.is_empty() {
            write_text_element(&mut writer, "platform", &self.platform)?;
        }
        if !self.import_project.is_empty() {
            write_text_element(&mut writer, "importproject", &self.import_project)?;
        }
        write_text_element(
            &mut writer,
            "analyze-all-vs-configs",
            bool_str(self.analyze_all_vs_configs),
        )?;
        write_text_element(&mut writer, "check-headers", bool_str(self.check_headers))?;
        write_text_element(
            &mut writer,
            "check-unused-templates",
            bool_str(self.check_unused_templates),
        )?;
        write_text_element(&mut writer, "max-ctu-depth", &self.max_ctu_depth.to_string())?;

        write_attr_list(&mut writer, "includedir", "dir", &self.include_dirs)?;
        write_attr_list(&mut writer, "defines", "define", &self.defines)?;
        write_text_list(&mut writer, "undefines", "undefine", &self.undefines)?;
        write_attr_list(&mut writer, "paths", "dir", &self.paths)?;
        write_attr_list(&mut writer, "exclude", "path", &self.exclude_paths)?;
        write_text_list(&mut writer, "libraries", "library", &self.libraries)?;

        if !self.suppressions.is_empty() {
            writer.write_event(Event::Start(BytesStart::new("suppressions")))?;
            for suppression in &self.suppressions {
                let mut e = BytesStart::new("suppression");
                if !suppression.file_name.is_empty() {
                    e.push_attribute(("fileName", suppression.file_name.as_str()));
                }
                if let Some(line) = suppression.line_number {
                    e.push_attribute(("lineNumber", line.to_string().as_str()));
                }
                if !suppression.symbol_name.is_empty() {
                    e.push_attribute(("symbolName", suppression.symbol_name.as_str()));
                }
                writer.write_event(Event::Start(e))?;
                writer.write_event(Event::Text(BytesText::new(&suppression.error_id)))?;
                writer.write_event(Event::End(BytesEnd::new("suppression")))?;
            }
            writer.write_event(Event::End(BytesEnd::new("suppressions")))?;
        }

        write_text_list(&mut writer, "addons", "addon", &self.addons)?;
        write_text_list(&mut writer, "tools", "tool", &self.tools)?;
        write_text_list(&mut writer, "tags", "tag", &self.tags)?;
        write_text_list(
            &mut writer,
            "check-unknown-function-return-values",
            "name",
            &self.check_unknown_function_return,
        )?;
        if self.check_all_function_parameter_values {
            writer.write_event(Event::Empty(BytesStart::new(
                "check-all-function-parameter-values",
            )))?;
        }

        writer.write_event(Event::End(BytesEnd::new("project")))?;

        let bytes = writer.into_inner().into_inner();
        let mut xml = String::from_utf8(bytes)
            .map_err(|e| CcflowError::Config(format!("project XML is not UTF-8: {e}")))?;
        xml.push('\n');
        Ok(xml)
    }
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

fn attr_value(e: &BytesStart<'_>, name: &str) -> Result<String> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == name.as_bytes() {
            return Ok(attr.unescape_value()?.into_owned());
        }
    }
    Ok(String::new())
}

/// Read a homogeneous child list such as `<includedir><dir name="..."/>
/// ...</includedir>`.
///
/// With `attribute` the value comes from that attribute of each child;
/// without, from the child's text content. The loop ends at the first
/// EndElement whose name is not the child element name — in well-formed
/// input, the parent's closing tag.
fn read_string_list(
    reader: &mut Reader<&[u8]>,
    list: &mut Vec<String>,
    element: &[u8],
    attribute: Option<&str>,
) -> Result<()> {
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if e.name().as_ref() == element {
                    match attribute {
                        Some(attr) => {
                            // The child's own End (same name) is skipped
                            // by the End arm below.
                            let value = attr_value(&e, attr)?;
                            if !value.is_empty() {
                                list.push(value);
                            }
                        }
                        None => {
                            let text = reader.read_text(e.name())?.into_owned();
                            if !text.is_empty() {
                                list.push(text);
                            }
                        }
                    }
                }
            }
            Event::Empty(e) => {
                if e.name().as_ref() == element {
                    if let Some(attr) = attribute {
                        let value = attr_value(&e, attr)?;
                        if !value.is_empty() {
                            list.push(value);
                        }
                    }
                }
            }
            Event::End(e) => {
                if e.name().as_ref() != element {
                    return Ok(());
                }
            }
            Event::Eof => return Ok(()),
            _ => {}
        }
    }
}

/// Read `<suppressions>` children. Terminates at the first EndElement
/// that is not `</suppression>` — the parent's closing tag.
fn read_suppressions(reader: &mut Reader<&[u8]>, list: &mut Vec<Suppression>) -> Result<()> {
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if e.name().as_ref() == b"suppression" {
                    let mut suppression = Suppression {
                        file_name: attr_value(&e, "fileName")?,
                        symbol_name: attr_value(&e, "symbolName")?,
                        ..Suppression::default()
                    };
                    let line = attr_value(&e, "lineNumber")?;
                    if !line.is_empty() {
                        suppression.line_number = line.trim().parse().ok();
                    }
                    suppression.error_id = reader.read_text(e.name())?.into_owned();
                    list.push(suppression);
                }
            }
            Event::Empty(e) => {
                if e.name().as_ref() == b"suppression" {
                    let mut suppression = Suppression {
                        file_name: attr_value(&e, "fileName")?,
                        symbol_name: attr_value(&e, "symbolName")?,
                        ..Suppression::default()
                    };
                    let line = attr_value(&e, "lineNumber")?;
                    if !line.is_empty() {
                        suppression.line_number = line.trim().parse().ok();
                    }
                    list.push(suppression);
                }
            }
            Event::End(e) => {
                if e.name().as_ref() != b"suppression" {
                    return Ok(());
                }
            }
            Event::Eof => return Ok(()),
            _ => {}
        }
    }
}

fn write_text_element(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    tag: &str,
    value: &str,
) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn write_attr_list(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    parent: &str,
    child: &str,
    values: &[String],
) -> Result<()> {
    if values.is_empty() {
        return Ok(());
    }
    writer.write_event(Event::Start(BytesStart::new(parent)))?;
    for value in values {
        let mut e = BytesStart::new(child);
        e.push_attribute(("name", value.as_str()));
        writer.write_event(Event::Empty(e))?;
    }
    writer.write_event(Event::End(BytesEnd::new(parent)))?;
    Ok(())
}

fn write_text_list(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    parent: &str,
    child: &str,
    values: &[String],
) -> Result<()> {
    if values.is_empty() {
        return Ok(());
    }
    writer.write_event(Event::Start(BytesStart::new(parent)))?;
    for value in values {
        write_text_element(writer, child, value)?;
    }
    writer.write_event(Event::End(BytesEnd::new(parent)))?;
    Ok(())
}
