use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hustle_media::image::mime::mime_for_extension;
use hustle_media::image::Upload;
use hustle_media::render::{self, EmbedOptions};
use hustle_media::{Bounds, Config, MediaInput, MediaPipeline, MediaSlot};
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "hustle-media")]
#[command(about = "Normalize uploaded images and video links for storage")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate, resize and re-encode an image file.
    Image {
        path: PathBuf,

        /// Upload field the image is for (avatar, exercise, progress, blog).
        #[arg(long, default_value = "exercise")]
        slot: MediaSlot,

        /// Override the slot's bounding box, e.g. 640x480.
        #[arg(long)]
        bounds: Option<Bounds>,

        /// Write the normalized JPEG here.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Include a data URI in the summary.
        #[arg(long)]
        data_uri: bool,
    },
    /// Validate a video link and print its canonical embed form.
    Video {
        url: String,

        #[arg(long, default_value = "exercise")]
        slot: MediaSlot,

        /// Include the iframe snippet in the summary.
        #[arg(long)]
        embed_code: bool,
    },
}

fn override_bounds(config: &mut Config, slot: MediaSlot, bounds: Bounds) {
    match slot {
        MediaSlot::Avatar => config.avatar_bounds = bounds,
        MediaSlot::Exercise | MediaSlot::Progress => config.content_bounds = bounds,
        MediaSlot::Blog => config.blog_bounds = bounds,
    }
}

async fn run(command: Command, mut config: Config) -> Result<Value> {
    match command {
        Command::Image {
            path,
            slot,
            bounds,
            output,
            data_uri,
        } => {
            if let Some(bounds) = bounds {
                override_bounds(&mut config, slot, bounds);
            }
            let pipeline = MediaPipeline::from_config(config);

            let data = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let mut upload = Upload::new(filename, data);
            if let Some(content_type) = upload.extension().as_deref().and_then(mime_for_extension) {
                upload = upload.with_content_type(content_type);
            }

            let media = pipeline.ingest(slot, MediaInput::Upload(upload)).await?;
            let image = media
                .as_image()
                .context("Image upload produced no image")?;

            if let Some(output) = output {
                tokio::fs::write(&output, image.payload())
                    .await
                    .with_context(|| format!("Failed to write {}", output.display()))?;
                info!("Wrote normalized image to {}", output.display());
            }

            let mut summary = json!({
                "media_type": image.media_type(),
                "width": image.width(),
                "height": image.height(),
                "bytes": image.len(),
            });
            if data_uri {
                summary["data_uri"] = json!(render::data_uri(image));
            }
            Ok(summary)
        }
        Command::Video {
            url,
            slot,
            embed_code,
        } => {
            let pipeline = MediaPipeline::from_config(config);

            let media = pipeline.ingest(slot, MediaInput::VideoLink(url)).await?;
            let video = media.as_video().context("Video link produced no video")?;

            let mut summary = json!({
                "reference": video,
                "metadata": pipeline.video().metadata(video),
            });
            if embed_code {
                summary["embed_code"] = json!(render::embed_code(video, &EmbedOptions::default()));
            }
            Ok(summary)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hustle_media=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    match run(args.command, config).await {
        Ok(summary) => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Err(e) => {
            if let Some(media_error) = e.downcast_ref::<hustle_media::Error>() {
                eprintln!("{}", media_error.user_message());
            }
            error!("Media processing failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_image_command() {
        let args = CliArgs::try_parse_from([
            "hustle-media",
            "image",
            "me.png",
            "--slot",
            "avatar",
            "--bounds",
            "256x256",
        ])
        .unwrap();

        match args.command {
            Command::Image { slot, bounds, .. } => {
                assert_eq!(slot, MediaSlot::Avatar);
                assert_eq!(bounds, Some(Bounds::new(256, 256).unwrap()));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_bad_bounds() {
        let result =
            CliArgs::try_parse_from(["hustle-media", "image", "me.png", "--bounds", "0x10"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_override_bounds_targets_slot() {
        let mut config = Config::default();
        override_bounds(&mut config, MediaSlot::Progress, Bounds::new(320, 240).unwrap());

        assert_eq!(config.content_bounds, Bounds::new(320, 240).unwrap());
        assert_eq!(config.avatar_bounds, Bounds::AVATAR);
    }

    #[tokio::test]
    async fn test_video_command_summary() {
        let summary = run(
            Command::Video {
                url: "https://youtu.be/dQw4w9WgXcQ".to_string(),
                slot: MediaSlot::Blog,
                embed_code: true,
            },
            Config::default(),
        )
        .await
        .unwrap();

        assert_eq!(summary["reference"]["video_id"], "dQw4w9WgXcQ");
        assert_eq!(
            summary["metadata"]["embed_url"],
            "https://www.youtube.com/embed/dQw4w9WgXcQ"
        );
        assert!(summary["embed_code"].as_str().unwrap().contains("<iframe"));
    }

    #[tokio::test]
    async fn test_image_command_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("wide.png");
        let output = dir.path().join("wide.jpg");
        image::RgbImage::from_pixel(1000, 250, image::Rgb([10, 200, 30]))
            .save(&input)
            .unwrap();

        let summary = run(
            Command::Image {
                path: input,
                slot: MediaSlot::Exercise,
                bounds: None,
                output: Some(output.clone()),
                data_uri: true,
            },
            Config::default(),
        )
        .await
        .unwrap();

        assert_eq!(summary["width"], 800);
        assert_eq!(summary["height"], 200);
        assert!(summary["data_uri"]
            .as_str()
            .unwrap()
            .starts_with("data:image/jpeg;base64,"));
        assert_eq!(image::image_dimensions(&output).unwrap(), (800, 200));
    }
}
