//! 3MF packaging: an OPC zip holding one mesh object in millimetres.

use std::io::{Cursor, Write};

use geom_kernel::RenderMesh;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ExportError;
use crate::stl::check_mesh;

const CORE_NS: &str = "http://schemas.microsoft.com/3dmanufacturing/core/2015/02";
const MODEL_PATH: &str = "3D/3dmodel.model";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="model" ContentType="application/vnd.ms-package.3dmanufacturing-3dmodel+xml"/>
</Types>
"#;

const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Target="/3D/3dmodel.model" Id="rel0" Type="http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel"/>
</Relationships>
"#;

fn xml_err(err: impl std::fmt::Display) -> ExportError {
    ExportError::Xml {
        reason: err.to_string(),
    }
}

/// The `3D/3dmodel.model` document for `mesh`.
pub fn model_xml(mesh: &RenderMesh, name: &str) -> Result<Vec<u8>, ExportError> {
    check_mesh(mesh)?;
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 1);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_err)?;
    let model = BytesStart::new("model").with_attributes([
        ("unit", "millimeter"),
        ("xml:lang", "en-US"),
        ("xmlns", CORE_NS),
    ]);
    writer.write_event(Event::Start(model)).map_err(xml_err)?;
    writer
        .write_event(Event::Start(BytesStart::new("resources")))
        .map_err(xml_err)?;
    let object = BytesStart::new("object").with_attributes([
        ("id", "1"),
        ("name", name),
        ("type", "model"),
    ]);
    writer.write_event(Event::Start(object)).map_err(xml_err)?;
    writer
        .write_event(Event::Start(BytesStart::new("mesh")))
        .map_err(xml_err)?;

    writer
        .write_event(Event::Start(BytesStart::new("vertices")))
        .map_err(xml_err)?;
    for p in mesh.vertices.chunks_exact(3) {
        let (x, y, z) = (p[0].to_string(), p[1].to_string(), p[2].to_string());
        let vertex =
            BytesStart::new("vertex").with_attributes([("x", x.as_str()), ("y", y.as_str()), ("z", z.as_str())]);
        writer.write_event(Event::Empty(vertex)).map_err(xml_err)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("vertices")))
        .map_err(xml_err)?;

    writer
        .write_event(Event::Start(BytesStart::new("triangles")))
        .map_err(xml_err)?;
    for t in mesh.indices.chunks_exact(3) {
        let (v1, v2, v3) = (t[0].to_string(), t[1].to_string(), t[2].to_string());
        let triangle = BytesStart::new("triangle").with_attributes([
            ("v1", v1.as_str()),
            ("v2", v2.as_str()),
            ("v3", v3.as_str()),
        ]);
        writer.write_event(Event::Empty(triangle)).map_err(xml_err)?;
    }
    for end in ["triangles", "mesh", "object", "resources"] {
        writer
            .write_event(Event::End(BytesEnd::new(end)))
            .map_err(xml_err)?;
    }

    writer
        .write_event(Event::Start(BytesStart::new("build")))
        .map_err(xml_err)?;
    writer
        .write_event(Event::Empty(
            BytesStart::new("item").with_attributes([("objectid", "1")]),
        ))
        .map_err(xml_err)?;
    writer
        .write_event(Event::End(BytesEnd::new("build")))
        .map_err(xml_err)?;
    writer
        .write_event(Event::End(BytesEnd::new("model")))
        .map_err(xml_err)?;

    Ok(writer.into_inner().into_inner())
}

/// A complete 3MF package for `mesh`.
pub fn three_mf(mesh: &RenderMesh, name: &str) -> Result<Vec<u8>, ExportError> {
    let model = model_xml(mesh, name)?;
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    for (path, bytes) in [
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", RELS.as_bytes()),
        (MODEL_PATH, model.as_slice()),
    ] {
        zip.start_file(path, options)?;
        zip.write_all(bytes).map_err(ZipError::from)?;
    }
    Ok(zip.finish()?.into_inner())
}
