use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use glam::{Vec2, Vec3};
use log::warn;

use crate::geometry::LitVertex;

/// One draw's worth of triangles sharing a material.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjMesh {
    pub vertices: Vec<LitVertex>,
    pub indices: Vec<u32>,
    pub material: Option<String>,
}

/// Texture maps referenced by an MTL material, resolved against the MTL's directory.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjMaterial {
    pub diffuse_map: Option<PathBuf>,
    pub specular_map: Option<PathBuf>,
    pub shininess: Option<f32>,
}

/// Meshes and materials read from an OBJ file and its MTL libraries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjModel {
    pub meshes: Vec<ObjMesh>,
    pub materials: HashMap<String, ObjMaterial>,
}

impl ObjModel {
    pub fn material_for(&self, mesh: &ObjMesh) -> Option<&ObjMaterial> {
        mesh.material.as_ref().and_then(|name| self.materials.get(name))
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|mesh| mesh.indices.len() / 3).sum()
    }
}

/// Reads an OBJ file from disk together with any `mtllib` it names.
///
/// A missing or broken MTL file is logged and the meshes render untextured.
pub fn load_obj(path: &Path) -> Result<ObjModel> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("unable to read {}", path.display()))?;
    let parsed = parse_obj(&contents)?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));

    let mut materials = HashMap::new();
    for library in &parsed.libraries {
        let library_path = base.join(library);
        match std::fs::read_to_string(&library_path) {
            Ok(mtl) => {
                let library_base = library_path.parent().unwrap_or(base);
                materials.extend(load_mtl_from_str(&mtl, library_base));
            }
            Err(err) => warn!(
                "material library {} unavailable: {err}",
                library_path.display()
            ),
        }
    }

    Ok(ObjModel {
        meshes: parsed.meshes,
        materials,
    })
}

/// Parses an OBJ file from memory and returns one mesh per material group.
///
/// Vertices are laid out as `position.xyz`, `normal.xyz`, `uv`.
pub fn load_obj_from_str(data: &str) -> Result<ObjModel> {
    let parsed = parse_obj(data)?;
    Ok(ObjModel {
        meshes: parsed.meshes,
        materials: HashMap::new(),
    })
}

struct ParsedObj {
    meshes: Vec<ObjMesh>,
    libraries: Vec<String>,
}

fn parse_obj(data: &str) -> Result<ParsedObj> {
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut texcoords = Vec::new();
    let mut groups: Vec<FaceGroup> = Vec::new();
    let mut current = FaceGroup::default();
    let mut libraries = Vec::new();

    for (line_no, line) in data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };
        match tag {
            "v" => positions.push(
                parse_vec3(parts)
                    .with_context(|| format!("invalid vertex on line {}", line_no + 1))?,
            ),
            "vn" => normals.push(
                parse_vec3(parts)
                    .with_context(|| format!("invalid normal on line {}", line_no + 1))?,
            ),
            "vt" => texcoords.push(
                parse_vec2(parts)
                    .with_context(|| format!("invalid texcoord on line {}", line_no + 1))?,
            ),
            "f" => {
                let polygon = parse_face(parts)
                    .with_context(|| format!("invalid face on line {}", line_no + 1))?;
                triangulate_face(&polygon, &mut current.faces);
            }
            "usemtl" => {
                let name = parts.collect::<Vec<_>>().join(" ");
                let next = FaceGroup {
                    material: Some(name),
                    faces: Vec::new(),
                };
                groups.push(std::mem::replace(&mut current, next));
            }
            "mtllib" => libraries.extend(parts.map(str::to_string)),
            _ => {}
        }
    }

    groups.push(current);

    if positions.is_empty() {
        return Err(anyhow!("OBJ file does not define any vertices"));
    }

    let mut meshes = Vec::new();
    for group in groups.into_iter().filter(|group| !group.faces.is_empty()) {
        let mut mesh = build_mesh(&positions, &normals, &texcoords, &group.faces)?;
        mesh.material = group.material;
        if needs_normals(&mesh.vertices) {
            compute_normals(&mut mesh);
        }
        meshes.push(mesh);
    }
    if meshes.is_empty() {
        return Err(anyhow!("OBJ file does not define any faces"));
    }

    Ok(ParsedObj { meshes, libraries })
}

/// Parses the texture-map subset of an MTL library.
pub fn load_mtl_from_str(data: &str, base: &Path) -> HashMap<String, ObjMaterial> {
    let mut materials = HashMap::new();
    let mut current: Option<(String, ObjMaterial)> = None;

    for line in data.lines() {
        let trimmed = line.trim();
        let Some((tag, rest)) = trimmed.split_once(char::is_whitespace) else {
            continue;
        };
        let rest = rest.trim();
        match tag {
            "newmtl" => {
                if let Some((name, material)) = current.take() {
                    materials.insert(name, material);
                }
                current = Some((rest.to_string(), ObjMaterial::default()));
            }
            "map_Kd" | "map_Ks" | "Ns" => {
                let Some((_, material)) = current.as_mut() else {
                    continue;
                };
                match tag {
                    "map_Kd" => material.diffuse_map = map_path(rest, base),
                    "map_Ks" => material.specular_map = map_path(rest, base),
                    _ => material.shininess = rest.parse::<f32>().ok(),
                }
            }
            _ => {}
        }
    }
    if let Some((name, material)) = current {
        materials.insert(name, material);
    }
    materials
}

/// The file name is the last token; leading tokens are map options such as `-bm 1`.
fn map_path(value: &str, base: &Path) -> Option<PathBuf> {
    let file = value.split_whitespace().last()?;
    Some(base.join(file.replace('\\', "/")))
}

#[derive(Debug, Default)]
struct FaceGroup {
    material: Option<String>,
    faces: Vec<[FaceIndex; 3]>,
}

fn parse_vec3<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Vec3> {
    let mut next = || -> Result<f32> {
        Ok(parts
            .next()
            .ok_or_else(|| anyhow!("missing vector component"))?
            .parse::<f32>()?)
    };
    Ok(Vec3::new(next()?, next()?, next()?))
}

fn parse_vec2<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Vec2> {
    let u = parts
        .next()
        .ok_or_else(|| anyhow!("missing texcoord component"))?
        .parse::<f32>()?;
    let v = parts.next().map(str::parse::<f32>).transpose()?.unwrap_or(0.0);
    Ok(Vec2::new(u, v))
}

fn parse_face<'a>(parts: impl Iterator<Item = &'a str>) -> Result<Vec<FaceIndex>> {
    let mut indices = Vec::new();
    for part in parts {
        let mut segments = part.split('/');
        let v = segments
            .next()
            .ok_or_else(|| anyhow!("missing vertex index"))?
            .parse::<i32>()?;
        let vt = optional_index(segments.next());
        let vn = optional_index(segments.next());
        indices.push(FaceIndex { v, vt, vn });
    }
    if indices.len() < 3 {
        return Err(anyhow!("faces must reference at least 3 vertices"));
    }
    Ok(indices)
}

fn optional_index(segment: Option<&str>) -> i32 {
    segment
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<i32>().ok())
        .unwrap_or(0)
}

fn triangulate_face(polygon: &[FaceIndex], faces: &mut Vec<[FaceIndex; 3]>) {
    for i in 1..polygon.len().saturating_sub(1) {
        faces.push([polygon[0], polygon[i], polygon[i + 1]]);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Key {
    position: usize,
    texcoord: Option<usize>,
    normal: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
struct FaceIndex {
    v: i32,
    vt: i32,
    vn: i32,
}

fn build_mesh(
    positions: &[Vec3],
    normals: &[Vec3],
    texcoords: &[Vec2],
    faces: &[[FaceIndex; 3]],
) -> Result<ObjMesh> {
    let mut lookup: HashMap<Key, u32> = HashMap::new();
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for face in faces {
        for idx in face {
            let position =
                fix_index(idx.v, positions.len()).ok_or_else(|| anyhow!("invalid vertex index"))?;
            let key = Key {
                position,
                texcoord: fix_index(idx.vt, texcoords.len()),
                normal: fix_index(idx.vn, normals.len()),
            };
            let next_index = vertices.len() as u32;
            let entry = lookup.entry(key).or_insert_with(|| {
                let normal = key.normal.map(|i| normals[i]).unwrap_or(Vec3::ZERO);
                // OBJ puts v=0 at the bottom of the image; textures are stored top row first.
                let uv = key
                    .texcoord
                    .map(|i| Vec2::new(texcoords[i].x, 1.0 - texcoords[i].y))
                    .unwrap_or(Vec2::ZERO);
                vertices.push(LitVertex {
                    position: positions[position].to_array(),
                    normal: normal.to_array(),
                    uv: uv.to_array(),
                });
                next_index
            });
            indices.push(*entry);
        }
    }

    Ok(ObjMesh {
        vertices,
        indices,
        material: None,
    })
}

fn fix_index(index: i32, len: usize) -> Option<usize> {
    if index > 0 {
        let zero_based = index as usize - 1;
        (zero_based < len).then_some(zero_based)
    } else if index < 0 {
        let abs = index.unsigned_abs() as usize;
        (abs <= len).then_some(len - abs)
    } else {
        None
    }
}

fn needs_normals(vertices: &[LitVertex]) -> bool {
    vertices.iter().any(|vertex| vertex.normal == [0.0; 3])
}

fn compute_normals(mesh: &mut ObjMesh) {
    let mut accum = vec![Vec3::ZERO; mesh.vertices.len()];

    for triangle in mesh.indices.chunks_exact(3) {
        let [i0, i1, i2] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
        let p0 = Vec3::from_array(mesh.vertices[i0].position);
        let p1 = Vec3::from_array(mesh.vertices[i1].position);
        let p2 = Vec3::from_array(mesh.vertices[i2].position);
        let normal = (p1 - p0).cross(p2 - p0);
        if normal.length_squared() > f32::EPSILON {
            let normal = normal.normalize();
            accum[i0] += normal;
            accum[i1] += normal;
            accum[i2] += normal;
        }
    }

    for (vertex, normal) in mesh.vertices.iter_mut().zip(accum) {
        if vertex.normal == [0.0; 3] {
            vertex.normal = normal.normalize_or_zero().to_array();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXTURED_QUAD: &str = "
mtllib fur.mtl
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
usemtl fur
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    #[test]
    fn parses_simple_triangle() {
        let obj = "\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let model = load_obj_from_str(obj).unwrap();
        assert_eq!(model.meshes.len(), 1);
        assert_eq!(model.meshes[0].indices, vec![0, 1, 2]);
        assert_eq!(model.meshes[0].vertices.len(), 3);
    }

    #[test]
    fn computes_missing_normals() {
        let obj = "\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let model = load_obj_from_str(obj).unwrap();
        for vertex in &model.meshes[0].vertices {
            assert!(Vec3::from_array(vertex.normal).abs_diff_eq(Vec3::Z, 1e-5));
        }
    }

    #[test]
    fn quads_are_triangulated_with_flipped_texcoords() {
        let model = load_obj_from_str(TEXTURED_QUAD).unwrap();
        let mesh = &model.meshes[0];
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.material.as_deref(), Some("fur"));
        assert_eq!(mesh.vertices[0].uv, [0.0, 1.0]);
        assert_eq!(mesh.vertices[2].uv, [1.0, 0.0]);
        assert_eq!(mesh.vertices[1].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn negative_indices_count_from_the_end() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let model = load_obj_from_str(obj).unwrap();
        assert_eq!(model.meshes[0].vertices[2].position, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn material_switches_split_meshes() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\n\
                   usemtl a\nf 1 2 3\nusemtl b\nf 2 4 3\n";
        let model = load_obj_from_str(obj).unwrap();
        assert_eq!(model.meshes.len(), 2);
        assert_eq!(model.meshes[1].material.as_deref(), Some("b"));
        assert_eq!(model.triangle_count(), 2);
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let obj = "v 0 0 0\nv 1 0 0\nf 1 2 7\n";
        assert!(load_obj_from_str(obj).is_err());
    }

    #[test]
    fn mtl_maps_resolve_against_base_directory() {
        let mtl = "newmtl fur\nNs 16\nmap_Kd -bm 1 textures\\fur.png\nmap_Ks spec.jpg\n\
                   newmtl eyes\nmap_Kd eyes.png\n";
        let materials = load_mtl_from_str(mtl, Path::new("objects/dog"));
        let fur = &materials["fur"];
        assert_eq!(
            fur.diffuse_map,
            Some(PathBuf::from("objects/dog/textures/fur.png"))
        );
        assert_eq!(fur.specular_map, Some(PathBuf::from("objects/dog/spec.jpg")));
        assert_eq!(fur.shininess, Some(16.0));
        assert!(materials["eyes"].specular_map.is_none());
    }

    #[test]
    fn load_obj_reads_material_library_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pet.obj"), TEXTURED_QUAD).unwrap();
        std::fs::write(dir.path().join("fur.mtl"), "newmtl fur\nmap_Kd fur.png\n").unwrap();
        let model = load_obj(&dir.path().join("pet.obj")).unwrap();
        let material = model.material_for(&model.meshes[0]).unwrap();
        assert_eq!(material.diffuse_map, Some(dir.path().join("fur.png")));
    }
}
