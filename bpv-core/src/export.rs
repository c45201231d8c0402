/// Export of the scene solid to STL and OBJ
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use crate::geometry::Mesh;
use crate::metadata::BlueprintId;
use crate::scene::SceneState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    StlAscii,
    StlBinary,
    Obj,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::StlAscii | ExportFormat::StlBinary => "stl",
            ExportFormat::Obj => "obj",
        }
    }

    /// `blueprint_{id}.{ext}`
    pub fn file_name(self, id: &BlueprintId) -> String {
        format!("blueprint_{}.{}", id, self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stl" => Ok(ExportFormat::StlAscii),
            "stl-binary" => Ok(ExportFormat::StlBinary),
            "obj" => Ok(ExportFormat::Obj),
            other => Err(format!("unknown export format {other:?}")),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::StlAscii => "stl",
            ExportFormat::StlBinary => "stl-binary",
            ExportFormat::Obj => "obj",
        })
    }
}

/// Write the solid of `scene` in `format`
pub fn export_scene<W: Write>(
    scene: &SceneState,
    format: ExportFormat,
    name: &str,
    writer: &mut W,
) -> io::Result<()> {
    let mesh = &scene.solid.mesh;
    match format {
        ExportFormat::StlAscii => write_ascii_stl(mesh, name, writer),
        ExportFormat::StlBinary => write_binary_stl(mesh, name, writer),
        ExportFormat::Obj => write_obj(mesh, name, writer),
    }
}

/// Export into a new file at `path`; write errors from the final flush are reported too
pub fn write_scene_file(
    scene: &SceneState,
    format: ExportFormat,
    name: &str,
    path: &Path,
) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    export_scene(scene, format, name, &mut writer)?;
    writer.flush()
}

pub fn write_ascii_stl<W: Write>(mesh: &Mesh, name: &str, writer: &mut W) -> io::Result<()> {
    writeln!(writer, "solid {name}")?;
    for triangle in &mesh.triangles {
        let n = triangle.calculate_normal();
        writeln!(writer, "  facet normal {} {} {}", n.x, n.y, n.z)?;
        writeln!(writer, "    outer loop")?;
        for vertex in &triangle.vertices {
            let p = vertex.position;
            writeln!(writer, "      vertex {} {} {}", p.x, p.y, p.z)?;
        }
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")?;
    }
    writeln!(writer, "endsolid {name}")
}

pub fn write_binary_stl<W: Write>(mesh: &Mesh, name: &str, writer: &mut W) -> io::Result<()> {
    // 80-byte header, must not start with "solid"
    let mut header = [0u8; 80];
    let label = format!("binary {name}");
    let len = label.len().min(header.len());
    header[..len].copy_from_slice(&label.as_bytes()[..len]);
    writer.write_all(&header)?;

    let count = u32::try_from(mesh.triangles.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "too many triangles for STL"))?;
    writer.write_all(&count.to_le_bytes())?;

    for triangle in &mesh.triangles {
        let n = triangle.calculate_normal();
        for value in [n.x, n.y, n.z] {
            writer.write_all(&value.to_le_bytes())?;
        }
        for vertex in &triangle.vertices {
            for value in [vertex.position.x, vertex.position.y, vertex.position.z] {
                writer.write_all(&value.to_le_bytes())?;
            }
        }
        // attribute byte count
        writer.write_all(&0u16.to_le_bytes())?;
    }
    Ok(())
}

pub fn write_obj<W: Write>(mesh: &Mesh, name: &str, writer: &mut W) -> io::Result<()> {
    writeln!(writer, "o {name}")?;
    for triangle in &mesh.triangles {
        for vertex in &triangle.vertices {
            let p = vertex.position;
            writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
        }
    }
    for triangle in &mesh.triangles {
        let n = triangle.calculate_normal();
        writeln!(writer, "vn {} {} {}", n.x, n.y, n.z)?;
    }
    // OBJ indices are 1-based; one normal per face
    for (face, _) in mesh.triangles.iter().enumerate() {
        let base = face * 3 + 1;
        let normal = face + 1;
        writeln!(
            writer,
            "f {}//{n} {}//{n} {}//{n}",
            base,
            base + 1,
            base + 2,
            n = normal
        )?;
    }
    Ok(())
}
