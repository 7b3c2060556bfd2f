#[cfg(target_arch = "wasm32")]
mod imp {
    use ::wgpu::util::DeviceExt;
    use gpu::{InstanceBuffer, InstanceBuffers};
    use scene::{HotspotKind, SceneConfig, SceneState};
    use scene::connectors::ConnectorSet;
    use std::borrow::Cow;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;

    /// Background of the map, behind every dot.
    const CLEAR_COLOR: u32 = 0xf1efed;
    const CYLINDER_SEGMENTS: u32 = 16;

    const CYLINDER_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    light_dir: vec3<f32>,
    ambient: f32,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) color: vec3<f32>,
};

@vertex
fn vs_main(
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) translation: vec3<f32>,
    @location(3) size: vec2<f32>,
    @location(4) color: vec3<f32>,
) -> VsOut {
    let scaled = vec3<f32>(position.x * size.x, position.y * size.y, position.z * size.x);
    return VsOut(
        globals.view_proj * vec4<f32>(scaled + translation, 1.0),
        normal,
        color,
    );
}

@fragment
fn fs_main(fs_in: VsOut) -> @location(0) vec4<f32> {
    let n = normalize(fs_in.normal);
    let l = normalize(globals.light_dir);
    let shade = globals.ambient + (1.0 - globals.ambient) * max(dot(n, l), 0.0);
    return vec4<f32>(fs_in.color * shade, 1.0);
}
"#;

    const TUBE_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    light_dir: vec3<f32>,
    ambient: f32,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) color: vec4<f32>,
};

@vertex
fn vs_main(
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec4<f32>,
) -> VsOut {
    return VsOut(globals.view_proj * vec4<f32>(position, 1.0), normal, color);
}

@fragment
fn fs_main(fs_in: VsOut) -> @location(0) vec4<f32> {
    let n = normalize(fs_in.normal);
    let l = normalize(globals.light_dir);
    let shade = globals.ambient + (1.0 - globals.ambient) * abs(dot(n, l));
    return vec4<f32>(fs_in.color.rgb * shade, fs_in.color.a);
}
"#;

    #[repr(C)]
    #[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
    struct Vertex {
        position: [f32; 3],
        normal: [f32; 3],
    }

    #[repr(C)]
    #[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
    struct Instance {
        translation: [f32; 3],
        /// Radius, height.
        size: [f32; 2],
        color: [f32; 3],
    }

    #[repr(C)]
    #[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
    struct Globals {
        view_proj: [[f32; 4]; 4],
        light_dir: [f32; 3],
        ambient: f32,
    }

    fn rgb(color: u32) -> [f32; 3] {
        [
            ((color >> 16) & 0xff) as f32 / 255.0,
            ((color >> 8) & 0xff) as f32 / 255.0,
            (color & 0xff) as f32 / 255.0,
        ]
    }

    /// One instanced cylinder group: the dot grid or one hotspot kind.
    #[derive(Debug)]
    struct Batch {
        buffer: ::wgpu::Buffer,
        capacity: u32,
        count: u32,
        size: [f32; 2],
        color: [f32; 3],
    }

    #[derive(Debug)]
    struct TubeGpu {
        generation: u32,
        positions: ::wgpu::Buffer,
        normals: ::wgpu::Buffer,
        indices: ::wgpu::Buffer,
        index_count: u32,
        color: ::wgpu::Buffer,
    }

    impl TubeGpu {
        fn destroy(&self) {
            self.positions.destroy();
            self.normals.destroy();
            self.indices.destroy();
            self.color.destroy();
        }
    }

    #[derive(Debug)]
    pub struct WgpuContext {
        pub _instance: &'static ::wgpu::Instance,
        pub surface: ::wgpu::Surface<'static>,
        pub device: ::wgpu::Device,
        pub queue: ::wgpu::Queue,
        pub config: ::wgpu::SurfaceConfiguration,
        pub _canvas: web_sys::HtmlCanvasElement,
        cylinder_pipeline: ::wgpu::RenderPipeline,
        tube_pipeline: ::wgpu::RenderPipeline,
        uniform_buffer: ::wgpu::Buffer,
        uniform_bind_group: ::wgpu::BindGroup,
        depth_view: ::wgpu::TextureView,
        cylinder_vertices: ::wgpu::Buffer,
        cylinder_indices: ::wgpu::Buffer,
        cylinder_index_count: u32,
        /// Dots first, then one batch per hotspot kind.
        batches: Vec<Batch>,
        tubes: Vec<Option<TubeGpu>>,
    }

    fn create_depth_view(
        device: &::wgpu::Device,
        config: &::wgpu::SurfaceConfiguration,
    ) -> ::wgpu::TextureView {
        let tex = device.create_texture(&::wgpu::TextureDescriptor {
            label: Some("dotmap-depth"),
            size: ::wgpu::Extent3d {
                width: config.width.max(1),
                height: config.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: ::wgpu::TextureDimension::D2,
            format: ::wgpu::TextureFormat::Depth24Plus,
            usage: ::wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        tex.create_view(&::wgpu::TextureViewDescriptor::default())
    }

    /// Unit-radius, unit-height cylinder centered on the origin, capped at
    /// both ends.
    fn generate_cylinder_mesh(segments: u32) -> (Vec<Vertex>, Vec<u16>) {
        let segments = segments.max(3);
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        // Side: two rings with outward normals.
        for i in 0..=segments {
            let a = i as f32 / segments as f32 * std::f32::consts::TAU;
            let (s, c) = a.sin_cos();
            vertices.push(Vertex {
                position: [s, 0.5, c],
                normal: [s, 0.0, c],
            });
            vertices.push(Vertex {
                position: [s, -0.5, c],
                normal: [s, 0.0, c],
            });
        }
        for i in 0..segments {
            let top = (i * 2) as u16;
            let bottom = top + 1;
            let next_top = top + 2;
            let next_bottom = top + 3;
            indices.extend_from_slice(&[top, bottom, next_top, next_top, bottom, next_bottom]);
        }

        // Caps: a center vertex plus a ring each.
        for (y, ny) in [(0.5f32, 1.0f32), (-0.5, -1.0)] {
            let center = vertices.len() as u16;
            vertices.push(Vertex {
                position: [0.0, y, 0.0],
                normal: [0.0, ny, 0.0],
            });
            for i in 0..=segments {
                let a = i as f32 / segments as f32 * std::f32::consts::TAU;
                let (s, c) = a.sin_cos();
                vertices.push(Vertex {
                    position: [s, y, c],
                    normal: [0.0, ny, 0.0],
                });
            }
            for i in 0..segments as u16 {
                let ring = center + 1 + i;
                if ny > 0.0 {
                    indices.extend_from_slice(&[center, ring, ring + 1]);
                } else {
                    indices.extend_from_slice(&[center, ring + 1, ring]);
                }
            }
        }

        (vertices, indices)
    }

    fn color_target(
        format: ::wgpu::TextureFormat,
        blend: ::wgpu::BlendState,
    ) -> [Option<::wgpu::ColorTargetState>; 1] {
        [Some(::wgpu::ColorTargetState {
            format,
            blend: Some(blend),
            write_mask: ::wgpu::ColorWrites::ALL,
        })]
    }

    const CYLINDER_ATTRIBUTES: [::wgpu::VertexAttribute; 2] =
        ::wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];
    const INSTANCE_ATTRIBUTES: [::wgpu::VertexAttribute; 3] =
        ::wgpu::vertex_attr_array![2 => Float32x3, 3 => Float32x2, 4 => Float32x3];
    const POSITION_ATTRIBUTES: [::wgpu::VertexAttribute; 1] =
        ::wgpu::vertex_attr_array![0 => Float32x3];
    const NORMAL_ATTRIBUTES: [::wgpu::VertexAttribute; 1] =
        ::wgpu::vertex_attr_array![1 => Float32x3];
    const TUBE_COLOR_ATTRIBUTES: [::wgpu::VertexAttribute; 1] =
        ::wgpu::vertex_attr_array![2 => Float32x4];

    pub async fn init_wgpu_from_canvas_id(canvas_id: &str) -> Result<WgpuContext, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("window missing"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("document missing"))?;
        let canvas_elem = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str("canvas missing"))?
            .dyn_into::<web_sys::HtmlCanvasElement>()?;

        let width = canvas_elem.width();
        let height = canvas_elem.height();

        // The surface must not outlive its instance; the instance lives for
        // the rest of the page.
        let instance: &'static ::wgpu::Instance = Box::leak(Box::new(::wgpu::Instance::new(
            &::wgpu::InstanceDescriptor {
                backends: ::wgpu::Backends::BROWSER_WEBGPU | ::wgpu::Backends::GL,
                ..Default::default()
            },
        )));

        let surface = instance
            .create_surface(::wgpu::SurfaceTarget::Canvas(canvas_elem.clone()))
            .map_err(|e| JsValue::from_str(&format!("surface error: {e}")))?;

        let adapter = instance
            .request_adapter(&::wgpu::RequestAdapterOptions {
                power_preference: ::wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| JsValue::from_str(&format!("adapter error: {e}")))?;

        let (device, queue) = adapter
            .request_device(&::wgpu::DeviceDescriptor {
                label: Some("dotmap-device"),
                required_features: ::wgpu::Features::empty(),
                required_limits: ::wgpu::Limits::downlevel_webgl2_defaults(),
                ..Default::default()
            })
            .await
            .map_err(|e| JsValue::from_str(&format!("device error: {e}")))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| JsValue::from_str("surface reports no formats"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(::wgpu::CompositeAlphaMode::Auto);

        let config = ::wgpu::SurfaceConfiguration {
            usage: ::wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            desired_maximum_frame_latency: 2,
            present_mode: ::wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let depth_view = create_depth_view(&device, &config);

        let cylinder_shader = device.create_shader_module(::wgpu::ShaderModuleDescriptor {
            label: Some("dotmap-cylinder-shader"),
            source: ::wgpu::ShaderSource::Wgsl(Cow::Borrowed(CYLINDER_SHADER)),
        });
        let tube_shader = device.create_shader_module(::wgpu::ShaderModuleDescriptor {
            label: Some("dotmap-tube-shader"),
            source: ::wgpu::ShaderSource::Wgsl(Cow::Borrowed(TUBE_SHADER)),
        });

        let uniform_buffer = device.create_buffer(&::wgpu::BufferDescriptor {
            label: Some("dotmap-globals"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: ::wgpu::BufferUsages::UNIFORM | ::wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&::wgpu::BindGroupLayoutDescriptor {
                label: Some("dotmap-globals-bgl"),
                entries: &[::wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ::wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: ::wgpu::BindingType::Buffer {
                        ty: ::wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&::wgpu::BindGroupDescriptor {
            label: Some("dotmap-globals-bg"),
            layout: &uniform_bind_group_layout,
            entries: &[::wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&::wgpu::PipelineLayoutDescriptor {
            label: Some("dotmap-pipeline-layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            immediate_size: 0,
        });

        let primitive = ::wgpu::PrimitiveState {
            topology: ::wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: ::wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: ::wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        };

        let cylinder_pipeline = device.create_render_pipeline(&::wgpu::RenderPipelineDescriptor {
            label: Some("dotmap-cylinder-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: ::wgpu::VertexState {
                module: &cylinder_shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    ::wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as ::wgpu::BufferAddress,
                        step_mode: ::wgpu::VertexStepMode::Vertex,
                        attributes: &CYLINDER_ATTRIBUTES,
                    },
                    ::wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Instance>() as ::wgpu::BufferAddress,
                        step_mode: ::wgpu::VertexStepMode::Instance,
                        attributes: &INSTANCE_ATTRIBUTES,
                    },
                ],
            },
            fragment: Some(::wgpu::FragmentState {
                module: &cylinder_shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &color_target(config.format, ::wgpu::BlendState::REPLACE),
            }),
            primitive,
            depth_stencil: Some(::wgpu::DepthStencilState {
                format: ::wgpu::TextureFormat::Depth24Plus,
                depth_write_enabled: true,
                depth_compare: ::wgpu::CompareFunction::Less,
                stencil: ::wgpu::StencilState::default(),
                bias: ::wgpu::DepthBiasState::default(),
            }),
            multisample: ::wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        // Connectors are translucent: depth-tested, not depth-written.
        let tube_pipeline = device.create_render_pipeline(&::wgpu::RenderPipelineDescriptor {
            label: Some("dotmap-tube-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: ::wgpu::VertexState {
                module: &tube_shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    ::wgpu::VertexBufferLayout {
                        array_stride: 12,
                        step_mode: ::wgpu::VertexStepMode::Vertex,
                        attributes: &POSITION_ATTRIBUTES,
                    },
                    ::wgpu::VertexBufferLayout {
                        array_stride: 12,
                        step_mode: ::wgpu::VertexStepMode::Vertex,
                        attributes: &NORMAL_ATTRIBUTES,
                    },
                    ::wgpu::VertexBufferLayout {
                        array_stride: 16,
                        step_mode: ::wgpu::VertexStepMode::Instance,
                        attributes: &TUBE_COLOR_ATTRIBUTES,
                    },
                ],
            },
            fragment: Some(::wgpu::FragmentState {
                module: &tube_shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &color_target(config.format, ::wgpu::BlendState::ALPHA_BLENDING),
            }),
            primitive,
            depth_stencil: Some(::wgpu::DepthStencilState {
                format: ::wgpu::TextureFormat::Depth24Plus,
                depth_write_enabled: false,
                depth_compare: ::wgpu::CompareFunction::LessEqual,
                stencil: ::wgpu::StencilState::default(),
                bias: ::wgpu::DepthBiasState::default(),
            }),
            multisample: ::wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let (vertices, indices) = generate_cylinder_mesh(CYLINDER_SEGMENTS);
        let cylinder_vertices = device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
            label: Some("dotmap-cylinder-vertices"),
            contents: bytemuck::cast_slice(&vertices),
            usage: ::wgpu::BufferUsages::VERTEX,
        });
        let cylinder_indices = device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
            label: Some("dotmap-cylinder-indices"),
            contents: bytemuck::cast_slice(&indices),
            usage: ::wgpu::BufferUsages::INDEX,
        });

        let globals = Globals {
            view_proj: [[0.0; 4]; 4],
            light_dir: [0.3, 1.0, 0.5],
            ambient: 0.55,
        };
        queue.write_buffer(&uniform_buffer, 0, bytemuck::bytes_of(&globals));

        Ok(WgpuContext {
            _instance: instance,
            surface,
            device,
            queue,
            config,
            _canvas: canvas_elem,
            cylinder_pipeline,
            tube_pipeline,
            uniform_buffer,
            uniform_bind_group,
            depth_view,
            cylinder_vertices,
            cylinder_indices,
            cylinder_index_count: indices.len() as u32,
            batches: Vec::new(),
            tubes: Vec::new(),
        })
    }

    fn create_batch(
        device: &::wgpu::Device,
        label: &str,
        capacity: u32,
        size: [f32; 2],
        color: [f32; 3],
    ) -> Batch {
        let buffer = device.create_buffer(&::wgpu::BufferDescriptor {
            label: Some(label),
            size: (capacity.max(1) as u64) * std::mem::size_of::<Instance>() as u64,
            usage: ::wgpu::BufferUsages::VERTEX | ::wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Batch {
            buffer,
            capacity,
            count: capacity,
            size,
            color,
        }
    }

    /// Allocates GPU buffers for a freshly installed scene. Contents arrive
    /// through `upload`.
    pub fn install_scene(ctx: &mut WgpuContext, config: &SceneConfig, scene: &SceneState) {
        release_scene(ctx);

        let layout = scene.layout();
        let counts = scene.instance_counts();
        let mut batches = vec![create_batch(
            &ctx.device,
            "dotmap-dot-instances",
            scene.dots().len() as u32,
            [config.dots.radius as f32, layout.dot_height as f32],
            rgb(config.dots.color),
        )];
        for kind in HotspotKind::ALL {
            batches.push(create_batch(
                &ctx.device,
                "dotmap-hotspot-instances",
                counts[kind as usize],
                [layout.hotspot_radius as f32, layout.hotspot_height as f32],
                rgb(kind.color()),
            ));
        }
        ctx.batches = batches;
    }

    pub fn release_scene(ctx: &mut WgpuContext) {
        for batch in ctx.batches.drain(..) {
            batch.buffer.destroy();
        }
        for tube in ctx.tubes.drain(..).flatten() {
            tube.destroy();
        }
    }

    fn upload_batch(queue: &::wgpu::Queue, batch: &Batch, source: &mut InstanceBuffer) {
        let Some(range) = source.take_dirty() else {
            return;
        };
        let last = range.last.min(batch.capacity.saturating_sub(1));
        if batch.capacity == 0 || range.first > last {
            return;
        }
        let instances: Vec<Instance> = (range.first..=last)
            .filter_map(|i| source.translation(i))
            .map(|translation| Instance {
                translation,
                size: batch.size,
                color: batch.color,
            })
            .collect();
        let offset = range.first as u64 * std::mem::size_of::<Instance>() as u64;
        queue.write_buffer(&batch.buffer, offset, bytemuck::cast_slice(&instances));
    }

    /// Copies whatever the frame driver wrote since the last call to the GPU.
    pub fn upload(ctx: &mut WgpuContext, buffers: &mut InstanceBuffers, connectors: &ConnectorSet) {
        if let Some((dots, hotspots)) = ctx.batches.split_first() {
            upload_batch(&ctx.queue, dots, buffers.dots_mut());
            for (batch, kind) in hotspots.iter().zip(HotspotKind::ALL) {
                upload_batch(&ctx.queue, batch, buffers.hotspots_mut(kind));
            }
        }

        for release in buffers.take_releases() {
            let slot = release.connector.as_usize();
            let stale = ctx
                .tubes
                .get(slot)
                .and_then(Option::as_ref)
                .is_some_and(|t| t.generation == release.generation);
            if stale {
                if let Some(tube) = ctx.tubes[slot].take() {
                    tube.destroy();
                }
            }
        }

        for (id, connector) in connectors.iter() {
            let Some(mirror) = buffers.connector_mut(id) else {
                continue;
            };
            let slot = id.as_usize();
            if ctx.tubes.len() <= slot {
                ctx.tubes.resize_with(slot + 1, || None);
            }

            if mirror.replaced || ctx.tubes[slot].is_none() {
                let style = connector.style();
                let [r, g, b] = rgb(style.color);
                let color = [r, g, b, style.opacity as f32];
                let tube = TubeGpu {
                    generation: mirror.generation,
                    positions: ctx.device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
                        label: Some("dotmap-tube-positions"),
                        contents: bytemuck::cast_slice(&mirror.positions),
                        usage: ::wgpu::BufferUsages::VERTEX | ::wgpu::BufferUsages::COPY_DST,
                    }),
                    normals: ctx.device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
                        label: Some("dotmap-tube-normals"),
                        contents: bytemuck::cast_slice(&mirror.normals),
                        usage: ::wgpu::BufferUsages::VERTEX | ::wgpu::BufferUsages::COPY_DST,
                    }),
                    indices: ctx.device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
                        label: Some("dotmap-tube-indices"),
                        contents: bytemuck::cast_slice(&mirror.indices),
                        usage: ::wgpu::BufferUsages::INDEX,
                    }),
                    index_count: mirror.indices.len() as u32,
                    color: ctx.device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
                        label: Some("dotmap-tube-color"),
                        contents: bytemuck::cast_slice(&color),
                        usage: ::wgpu::BufferUsages::VERTEX,
                    }),
                };
                if let Some(old) = ctx.tubes[slot].replace(tube) {
                    old.destroy();
                }
            } else if mirror.vertices_dirty {
                if let Some(tube) = &ctx.tubes[slot] {
                    ctx.queue
                        .write_buffer(&tube.positions, 0, bytemuck::cast_slice(&mirror.positions));
                    ctx.queue
                        .write_buffer(&tube.normals, 0, bytemuck::cast_slice(&mirror.normals));
                }
            }
            mirror.replaced = false;
            mirror.vertices_dirty = false;
        }
    }

    pub fn resize_wgpu(ctx: &mut WgpuContext, width: u32, height: u32) {
        ctx.config.width = width.max(1);
        ctx.config.height = height.max(1);
        ctx.surface.configure(&ctx.device, &ctx.config);
        ctx.depth_view = create_depth_view(&ctx.device, &ctx.config);
    }

    pub fn render_scene(ctx: &WgpuContext, view_proj: [[f32; 4]; 4]) -> Result<(), JsValue> {
        let frame = ctx
            .surface
            .get_current_texture()
            .map_err(|e| JsValue::from_str(&format!("surface acquire failed: {e}")))?;
        let view = frame
            .texture
            .create_view(&::wgpu::TextureViewDescriptor::default());

        let globals = Globals {
            view_proj,
            light_dir: [0.3, 1.0, 0.5],
            ambient: 0.55,
        };
        ctx.queue
            .write_buffer(&ctx.uniform_buffer, 0, bytemuck::bytes_of(&globals));

        let mut encoder = ctx
            .device
            .create_command_encoder(&::wgpu::CommandEncoderDescriptor {
                label: Some("dotmap-encoder"),
            });

        {
            let [r, g, b] = rgb(CLEAR_COLOR);
            let mut rpass = encoder.begin_render_pass(&::wgpu::RenderPassDescriptor {
                label: Some("dotmap-scene-pass"),
                color_attachments: &[Some(::wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: ::wgpu::Operations {
                        load: ::wgpu::LoadOp::Clear(::wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: ::wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(::wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_view,
                    depth_ops: Some(::wgpu::Operations {
                        load: ::wgpu::LoadOp::Clear(1.0),
                        store: ::wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

            rpass.set_bind_group(0, &ctx.uniform_bind_group, &[]);

            rpass.set_pipeline(&ctx.cylinder_pipeline);
            rpass.set_vertex_buffer(0, ctx.cylinder_vertices.slice(..));
            rpass.set_index_buffer(ctx.cylinder_indices.slice(..), ::wgpu::IndexFormat::Uint16);
            for batch in ctx.batches.iter().filter(|b| b.count > 0) {
                rpass.set_vertex_buffer(1, batch.buffer.slice(..));
                rpass.draw_indexed(0..ctx.cylinder_index_count, 0, 0..batch.count);
            }

            rpass.set_pipeline(&ctx.tube_pipeline);
            for tube in ctx.tubes.iter().flatten().filter(|t| t.index_count > 0) {
                rpass.set_vertex_buffer(0, tube.positions.slice(..));
                rpass.set_vertex_buffer(1, tube.normals.slice(..));
                rpass.set_vertex_buffer(2, tube.color.slice(..));
                rpass.set_index_buffer(tube.indices.slice(..), ::wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..tube.index_count, 0, 0..1);
            }
        }

        ctx.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod imp {
    use gpu::InstanceBuffers;
    use scene::connectors::ConnectorSet;
    use scene::{SceneConfig, SceneState};
    use wasm_bindgen::prelude::JsValue;

    #[derive(Debug, Default)]
    pub struct WgpuContext;

    pub async fn init_wgpu_from_canvas_id(_canvas_id: &str) -> Result<WgpuContext, JsValue> {
        Err(JsValue::from_str(
            "wgpu initialization is only available on wasm32 targets",
        ))
    }

    pub fn resize_wgpu(_ctx: &mut WgpuContext, _width: u32, _height: u32) {}

    pub fn install_scene(_ctx: &mut WgpuContext, _config: &SceneConfig, _scene: &SceneState) {}

    pub fn release_scene(_ctx: &mut WgpuContext) {}

    pub fn upload(_ctx: &mut WgpuContext, _buffers: &mut InstanceBuffers, _connectors: &ConnectorSet) {}

    pub fn render_scene(_ctx: &WgpuContext, _view_proj: [[f32; 4]; 4]) -> Result<(), JsValue> {
        Err(JsValue::from_str(
            "wgpu rendering is only available on wasm32 targets",
        ))
    }
}

pub use imp::{
    WgpuContext, init_wgpu_from_canvas_id, install_scene, release_scene, render_scene, resize_wgpu,
    upload,
};
