use anyhow::{Context, Result, anyhow};
use std::ops::Range;
use std::path::Path;
use wgpu::util::DeviceExt;

pub mod texture {
    use super::*;

    /// The bind group keeps its view and sampler alive.
    pub struct Texture {
        pub bind_group: wgpu::BindGroup,
    }

    pub fn bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
            label: Some("texture_bind_group_layout"),
        })
    }

    fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        rgba: &[u8],
        (width, height): (u32, u32),
        label: &str,
    ) -> Texture {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            rgba,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
            label: Some(label),
        });

        Texture { bind_group }
    }

    /// 1x1 white texture bound when an image is missing or unreadable.
    pub fn placeholder(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
    ) -> Texture {
        from_rgba(device, queue, layout, &[255, 255, 255, 255], (1, 1), "placeholder_texture")
    }

    /// Loads an image from disk, falling back to the white placeholder.
    pub fn load<P: AsRef<Path>>(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        path: P,
    ) -> Texture {
        let path = path.as_ref();
        let label = path.display().to_string();

        let decoded = image::open(path)
            .with_context(|| format!("failed to load texture {}", label))
            .map(|img| img.to_rgba8());

        match decoded {
            Ok(rgba) => {
                let dimensions = rgba.dimensions();
                log::debug!("loaded texture {} ({}x{})", label, dimensions.0, dimensions.1);
                from_rgba(device, queue, layout, &rgba, dimensions, &label)
            }
            Err(e) => {
                log::warn!("{:#}, using placeholder", e);
                placeholder(device, queue, layout)
            }
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2, 2 => Float32x3];
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Per-draw data streamed through the instance buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 3]; 3],
    pub color: [f32; 4],
}

impl InstanceRaw {
    pub fn new(model: glam::Mat4, color: glam::Vec4) -> Self {
        let normal = glam::Mat3::from_mat4(model).inverse().transpose();
        let normal = if normal.is_finite() { normal } else { glam::Mat3::IDENTITY };
        Self {
            model: model.to_cols_array_2d(),
            normal: normal.to_cols_array_2d(),
            color: color.to_array(),
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        const ATTRIBS: [wgpu::VertexAttribute; 8] = wgpu::vertex_attr_array![
            5 => Float32x4, 6 => Float32x4, 7 => Float32x4, 8 => Float32x4,
            9 => Float32x3, 10 => Float32x3, 11 => Float32x3,
            12 => Float32x4
        ];
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBS,
        }
    }
}

/// CPU-side geometry, ready to upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Bounding box of the scene: `size` wide, `height` tall, base at `y_offset`.
pub fn cube(size: f32, height: f32, y_offset: f32) -> MeshData {
    let half = size * 0.5;
    let top = y_offset + height;
    let corners = [
        [-half, y_offset, -half],
        [half, y_offset, -half],
        [half, y_offset, half],
        [-half, y_offset, half],
        [-half, top, -half],
        [half, top, -half],
        [half, top, half],
        [-half, top, half],
    ];
    let tex_coords = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

    let vertices = corners
        .iter()
        .enumerate()
        .map(|(i, position)| Vertex {
            position: *position,
            tex_coords: tex_coords[i % 4],
            normal: [0.0, 1.0, 0.0],
        })
        .collect();

    #[rustfmt::skip]
    let indices = vec![
        0, 1, 2, 2, 3, 0,
        4, 5, 6, 6, 7, 4,
        0, 1, 5, 5, 4, 0,
        1, 2, 6, 6, 5, 1,
        2, 3, 7, 7, 6, 2,
        3, 0, 4, 4, 7, 3,
    ];

    MeshData { vertices, indices }
}

fn load_obj(path: &Path) -> Result<MeshData> {
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )?;

    let mut data = MeshData::default();
    for model in &models {
        let mesh = &model.mesh;
        let base = data.vertices.len() as u32;
        let count = mesh.positions.len() / 3;

        for i in 0..count {
            let normal = if mesh.normals.len() >= 3 * (i + 1) {
                [mesh.normals[3 * i], mesh.normals[3 * i + 1], mesh.normals[3 * i + 2]]
            } else {
                [0.0, 1.0, 0.0]
            };
            let tex_coords = if mesh.texcoords.len() >= 2 * (i + 1) {
                [mesh.texcoords[2 * i], mesh.texcoords[2 * i + 1]]
            } else {
                [0.0, 0.0]
            };
            data.vertices.push(Vertex {
                position: [
                    mesh.positions[3 * i],
                    mesh.positions[3 * i + 1],
                    mesh.positions[3 * i + 2],
                ],
                tex_coords,
                normal,
            });
        }

        data.indices.extend(mesh.indices.iter().map(|index| base + index));
    }

    Ok(data)
}

fn load_gltf(path: &Path) -> Result<MeshData> {
    let (doc, buffers, _images) = gltf::import(path)?;

    let mut data = MeshData::default();
    for mesh in doc.meshes() {
        for primitive in mesh.primitives() {
            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .ok_or_else(|| anyhow!("primitive without positions"))?
                .collect();
            let normals: Vec<[f32; 3]> = match reader.read_normals() {
                Some(normals) => normals.collect(),
                None => vec![[0.0, 1.0, 0.0]; positions.len()],
            };
            let tex_coords: Vec<[f32; 2]> = match reader.read_tex_coords(0) {
                Some(coords) => coords.into_f32().collect(),
                None => vec![[0.0, 0.0]; positions.len()],
            };

            let base = data.vertices.len() as u32;
            data.vertices.extend(
                positions
                    .iter()
                    .zip(normals.iter())
                    .zip(tex_coords.iter())
                    .map(|((pos, norm), tc)| Vertex {
                        position: *pos,
                        tex_coords: *tc,
                        normal: *norm,
                    }),
            );

            match reader.read_indices() {
                Some(indices) => data.indices.extend(indices.into_u32().map(|i| base + i)),
                None => data.indices.extend(base..data.vertices.len() as u32),
            }
        }
    }

    Ok(data)
}

/// Loads an OBJ or glTF file. Failures are logged and produce an empty mesh.
pub fn load_mesh<P: AsRef<Path>>(path: P) -> MeshData {
    let path = path.as_ref();
    let is_gltf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gltf") || ext.eq_ignore_ascii_case("glb"));

    let loaded = if is_gltf { load_gltf(path) } else { load_obj(path) };

    match loaded.with_context(|| format!("failed to load mesh {}", path.display())) {
        Ok(data) => {
            log::debug!(
                "loaded mesh {}: {} vertices, {} indices",
                path.display(),
                data.vertices.len(),
                data.indices.len()
            );
            data
        }
        Err(e) => {
            log::error!("{:#}", e);
            MeshData::default()
        }
    }
}

pub struct Mesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_indices: u32,
}

impl Mesh {
    /// Uploads geometry. Returns `None` for an empty mesh, which is never drawn.
    pub fn upload(device: &wgpu::Device, name: &str, data: &MeshData) -> Option<Self> {
        if data.is_empty() {
            return None;
        }

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", name)),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", name)),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Some(Self {
            vertex_buffer,
            index_buffer,
            num_indices: data.indices.len() as u32,
        })
    }
}

pub trait Drawable<'a> {
    fn draw_mesh(&mut self, mesh: &'a Mesh, texture: &'a texture::Texture, instances: Range<u32>);
}

impl<'a, 'b> Drawable<'a> for wgpu::RenderPass<'b>
where
    'a: 'b,
{
    fn draw_mesh(&mut self, mesh: &'a Mesh, texture: &'a texture::Texture, instances: Range<u32>) {
        self.set_bind_group(1, &texture.bind_group, &[]);
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.num_indices, 0, instances);
    }
}
