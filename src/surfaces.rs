/// The two stacked layer targets. Back is composited behind the page content
/// (the overlay UI), front above it.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Back,
    Front,
}

pub struct LayerTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

/// Pixel dimensions shared by both layer targets. Degenerate viewports clamp
/// to one pixel, which wgpu requires of texture extents.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn clamped(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }
}

/// Owns the two same-sized offscreen surfaces and keeps their pixel
/// dimensions synced to the viewport. Both targets are always created from
/// the one tracked size, so they cannot drift apart. Resizing recreates the
/// textures, which discards their contents; every frame repaints both in
/// full anyway.
pub struct SurfaceManager {
    pub back: LayerTarget,
    pub front: LayerTarget,
    size: SurfaceSize,
}

/// Layer targets use a fixed format independent of the swapchain; the
/// composite pass samples them.
pub const LAYER_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

impl SurfaceManager {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let size = SurfaceSize::clamped(width, height);

        Self {
            back: create_target(device, size),
            front: create_target(device, size),
            size,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        let size = SurfaceSize::clamped(width, height);
        if size == self.size {
            return;
        }

        self.size = size;
        self.back = create_target(device, size);
        self.front = create_target(device, size);
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub fn target(&self, layer: Layer) -> &LayerTarget {
        match layer {
            Layer::Back => &self.back,
            Layer::Front => &self.front,
        }
    }
}

fn create_target(device: &wgpu::Device, size: SurfaceSize) -> LayerTarget {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("layer target"),
        size: wgpu::Extent3d {
            width: size.width,
            height: size.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: LAYER_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    LayerTarget { texture, view }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_sizes_pass_through_exactly() {
        assert_eq!(
            SurfaceSize::clamped(800, 600),
            SurfaceSize {
                width: 800,
                height: 600,
            }
        );
    }

    #[test]
    fn degenerate_viewports_clamp_to_one_pixel() {
        assert_eq!(
            SurfaceSize::clamped(0, 0),
            SurfaceSize {
                width: 1,
                height: 1,
            }
        );
        assert_eq!(
            SurfaceSize::clamped(1920, 0),
            SurfaceSize {
                width: 1920,
                height: 1,
            }
        );
        assert_eq!(
            SurfaceSize::clamped(0, 1080),
            SurfaceSize {
                width: 1,
                height: 1080,
            }
        );
    }

    #[test]
    fn a_resize_sequence_lands_on_the_latest_dimensions() {
        // Mirrors SurfaceManager::resize bookkeeping: repeats are skipped,
        // every change replaces the shared size both targets derive from.
        let mut size = SurfaceSize::clamped(800, 600);
        let mut rebuilds = 0;

        for (width, height) in [(1024, 768), (1024, 768), (0, 0), (640, 480)] {
            let next = SurfaceSize::clamped(width, height);
            if next != size {
                size = next;
                rebuilds += 1;
            }
        }

        assert_eq!(
            size,
            SurfaceSize {
                width: 640,
                height: 480,
            }
        );
        assert_eq!(rebuilds, 3);
    }
}
