//! Verification compute pipeline
//!
//! Host side of the ECDSA kernel: marshals a batch into struct-of-arrays
//! word buffers, dispatches it in chunks that fit the device limits and
//! copies the verdicts back in input order.

use super::{GpuContext, GpuError, GpuResult};
use crate::batch::BatchInput;
use bytemuck::{Pod, Zeroable};
use k1::{HASH_SIZE, PUBKEY_SIZE, SIGNATURE_SIZE};
use std::ops::Range;
use wgpu::util::DeviceExt;

/// Invocations per workgroup; must match `@workgroup_size` in the shader
pub const WORKGROUP_SIZE: u32 = 64;

/// 32-bit words per 256-bit value
const WORDS: usize = 8;

/// Bytes per 256-bit value
const VALUE_BYTES: usize = 32;

const SHADER_SOURCE: &str = include_str!("shaders/ecdsa.wgsl");

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct Params {
    count: u32,
    _pad: [u32; 3],
}

/// The compiled verification kernel and its bind group layout
pub struct VerifyPipeline {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl VerifyPipeline {
    /// Compiles the kernel on `ctx`'s device
    pub fn new(ctx: &GpuContext) -> GpuResult<Self> {
        let shader = ctx
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("ECDSA Verify Shader"),
                source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
            });

        let bind_group_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("ECDSA Verify Bind Group Layout"),
                    entries: &[
                        // hashes, r, s, pubkeys
                        storage_entry(0, true),
                        storage_entry(1, true),
                        storage_entry(2, true),
                        storage_entry(3, true),
                        // verdicts
                        storage_entry(4, false),
                        wgpu::BindGroupLayoutEntry {
                            binding: 5,
                            visibility: wgpu::ShaderStages::COMPUTE,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Uniform,
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        },
                    ],
                });

        let pipeline_layout =
            ctx.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("ECDSA Verify Pipeline Layout"),
                    bind_group_layouts: &[&bind_group_layout],
                    push_constant_ranges: &[],
                });

        let pipeline = ctx
            .device
            .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("ECDSA Verify Pipeline"),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: Some("main"),
                compilation_options: Default::default(),
                cache: None,
            });

        Ok(Self {
            pipeline,
            bind_group_layout,
        })
    }

    /// Largest chunk one dispatch can take on this device
    pub fn items_per_dispatch(&self, ctx: &GpuContext, max_dispatch: usize) -> usize {
        let limits = ctx.device.limits();
        let by_groups = limits.max_compute_workgroups_per_dimension as usize * WORKGROUP_SIZE as usize;
        let by_binding = limits.max_storage_buffer_binding_size as usize / VALUE_BYTES;
        max_dispatch.min(by_groups).min(by_binding).max(1)
    }

    /// Verifies every request of `input`, writing `verdicts[i]` for request `i`
    pub async fn run(
        &self,
        ctx: &GpuContext,
        input: &BatchInput<'_>,
        verdicts: &mut [u32],
        max_dispatch: usize,
    ) -> GpuResult<()> {
        let chunk = self.items_per_dispatch(ctx, max_dispatch);
        let mut start = 0;
        for out in verdicts.chunks_mut(chunk) {
            let range = start..start + out.len();
            start = range.end;
            log::debug!("GPU dispatch of requests {:?}", range);
            self.run_chunk(ctx, input, range, out).await?;
        }
        Ok(())
    }

    async fn run_chunk(
        &self,
        ctx: &GpuContext,
        input: &BatchInput<'_>,
        range: Range<usize>,
        out: &mut [u32],
    ) -> GpuResult<()> {
        let count = range.len();
        let hashes = &input.hashes()[range.start * HASH_SIZE..range.end * HASH_SIZE];
        let signatures = &input.signatures()[range.start * SIGNATURE_SIZE..range.end * SIGNATURE_SIZE];
        let pubkeys = &input.pubkeys()[range.start * PUBKEY_SIZE..range.end * PUBKEY_SIZE];

        let hash_words = words_from_be(hashes, HASH_SIZE, 0, "hash words")?;
        let r_words = words_from_be(signatures, SIGNATURE_SIZE, 0, "signature r words")?;
        let s_words = words_from_be(signatures, SIGNATURE_SIZE, VALUE_BYTES, "signature s words")?;
        let pubkey_words = words_from_be(pubkeys, PUBKEY_SIZE, 0, "pubkey words")?;

        let params = Params {
            count: count as u32,
            _pad: [0; 3],
        };
        let verdict_bytes = std::mem::size_of_val(out) as u64;

        // Every buffer below is dropped, and released, on each return path.
        ctx.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let hash_buffer = storage_buffer(ctx, "Hash Buffer", &hash_words);
        let r_buffer = storage_buffer(ctx, "Signature R Buffer", &r_words);
        let s_buffer = storage_buffer(ctx, "Signature S Buffer", &s_words);
        let pubkey_buffer = storage_buffer(ctx, "Pubkey Buffer", &pubkey_words);

        let verdict_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Verdict Buffer"),
            size: verdict_bytes,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let staging_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Staging Buffer"),
            size: verdict_bytes,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let params_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Params Buffer"),
                contents: bytemuck::bytes_of(&params),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        if let Some(err) = ctx.device.pop_error_scope().await {
            log::warn!("GPU buffer allocation failed: {}", err);
            return Err(GpuError::OutOfMemory {
                what: "verification buffers",
                bytes: (count * (4 * VALUE_BYTES)) as u64 + 2 * verdict_bytes,
            });
        }

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ECDSA Verify Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: hash_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: r_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: s_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: pubkey_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: verdict_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        });

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("ECDSA Verify Encoder"),
            });

        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("ECDSA Verify Pass"),
                timestamp_writes: None,
            });

            compute_pass.set_pipeline(&self.pipeline);
            compute_pass.set_bind_group(0, &bind_group, &[]);
            compute_pass.dispatch_workgroups((count as u32).div_ceil(WORKGROUP_SIZE), 1, 1);
        }

        encoder.copy_buffer_to_buffer(&verdict_buffer, 0, &staging_buffer, 0, verdict_bytes);
        ctx.queue.submit(Some(encoder.finish()));

        let buffer_slice = staging_buffer.slice(..);
        let (sender, receiver) = flume::unbounded();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            // The receiver outlives the poll below; a send error means the
            // call already returned with an error.
            let _ = sender.send(result);
        });

        ctx.device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: None,
            })
            .map_err(|e| GpuError::WgpuError(e.to_string()))?;
        receiver
            .recv_async()
            .await
            .map_err(|e| GpuError::BufferError(e.to_string()))??;

        {
            let data = buffer_slice.get_mapped_range();
            out.copy_from_slice(bytemuck::cast_slice(&data));
        }
        staging_buffer.unmap();

        Ok(())
    }
}

fn storage_buffer(ctx: &GpuContext, label: &'static str, words: &[u32]) -> wgpu::Buffer {
    ctx.device
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(words),
            usage: wgpu::BufferUsages::STORAGE,
        })
}

/// Converts big-endian 256-bit values into little-endian-ordered u32 words
///
/// Reads the 32-byte value at `offset` inside every `stride`-byte record and
/// emits 8 words per value, least significant word first, which is the
/// limb order the kernel expects.
pub(crate) fn words_from_be(
    records: &[u8],
    stride: usize,
    offset: usize,
    what: &'static str,
) -> GpuResult<Vec<u32>> {
    let count = records.len() / stride;
    let mut words = Vec::new();
    words
        .try_reserve_exact(count * WORDS)
        .map_err(|_| GpuError::HostAllocation {
            what,
            bytes: count * VALUE_BYTES,
        })?;

    for record in records.chunks_exact(stride) {
        let value = &record[offset..offset + VALUE_BYTES];
        for j in 0..WORDS {
            let end = VALUE_BYTES - 4 * j;
            words.push(u32::from_be_bytes([
                value[end - 4],
                value[end - 3],
                value[end - 2],
                value[end - 1],
            ]));
        }
    }

    Ok(words)
}
