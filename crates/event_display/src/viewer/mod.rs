//! Interactive window showing the figure: drag to orbit, scroll to zoom,
//! Escape to close.

pub mod app;
pub mod context;

use crate::camera::Camera;
use crate::plot::FigureSize;
use anyhow::Result;
use app::App;
use cylmesh::Scene;
use std::path::PathBuf;
use std::sync::Arc;
use winit::{
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

/// Opens the viewer and blocks until the window is closed.
pub fn run(scene: Scene, camera: Camera, figure: FigureSize, save_path: PathBuf) -> Result<()> {
    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(scene.title.as_str())
            .with_inner_size(winit::dpi::LogicalSize::new(figure.width, figure.height))
            .build(&event_loop)?,
    );

    let mut app = pollster::block_on(App::new(window.clone(), scene, camera, figure, save_path))?;

    event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => {
                if !app.handle_event(&window, &event) {
                    match event {
                        WindowEvent::CloseRequested => elwt.exit(),
                        WindowEvent::KeyboardInput { event, .. } => {
                            if event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                                elwt.exit();
                            }
                        }
                        WindowEvent::RedrawRequested => match app.render(&window) {
                            Ok(_) => {}
                            Err(wgpu::SurfaceError::Lost) => {
                                app.resize(app.gfx.size);
                            }
                            Err(wgpu::SurfaceError::OutOfMemory) => {
                                log::error!("WGPU out of memory, exiting.");
                                elwt.exit();
                            }
                            Err(e) => log::error!("Render error: {:?}", e),
                        },
                        _ => {}
                    }
                }
            }
            Event::AboutToWait => {
                window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}
