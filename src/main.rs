//! Plaza Town Demo
//!
//! Runs a scripted session against the simulation core: walks the local
//! player out of a conversation area and up to the piano, opens and closes
//! the piano overlay, and exercises the proximity-audio path at several
//! listener distances.
//!
//! Set `PLAZA_SERVER_URL` to additionally pump the emitted messages over a
//! live town socket.

use anyhow::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use plaza::game::audio::AudioOutput;
use plaza::game::events::SceneEvent;
use plaza::game::scene::SceneConfig;
use plaza::game::tick::tick;
use plaza::game::zone::{MapObject, SPAWN_POINT_NAME};
use plaza::network::{dispatch, ClientMessage, ServerMessage, SocketPump};
use plaza::{
    CollisionResolver, KeyCode, NoteIntent, PlayerId, PlayerInfo, PlayerLocation, Rect, TownScene,
    Vec2, PIANO_POSITION, TICK_RATE, VERSION,
};

/// Frame duration for the scripted run.
const DT: f32 = 1.0 / TICK_RATE as f32;

/// Receiver output that logs instead of synthesizing.
struct DemoSpeaker;

impl AudioOutput for DemoSpeaker {
    fn start(&mut self, note: &str, gain: f32) {
        info!("speaker: start {note} at gain {gain:.2}");
    }
    fn stop(&mut self, note: &str) {
        info!("speaker: release {note}");
    }
}

/// Collision resolver clamping the player inside the walkable map area.
struct MapWalls {
    bounds: Rect,
}

impl CollisionResolver for MapWalls {
    fn resolve(&self, from: Vec2, velocity: Vec2, dt: f32) -> Vec2 {
        let next = from.add(velocity.scale(dt));
        Vec2::new(
            next.x.clamp(self.bounds.x, self.bounds.right()),
            next.y.clamp(self.bounds.y, self.bounds.bottom()),
        )
    }
}

/// The demo map's object layer.
fn demo_object_layer() -> Vec<MapObject> {
    use std::collections::BTreeMap;

    let mut transporter_props = BTreeMap::new();
    transporter_props.insert("target".to_string(), "Plaza Fountain".to_string());

    vec![
        MapObject {
            id: 1,
            name: SPAWN_POINT_NAME.to_string(),
            object_type: String::new(),
            x: 2050.0,
            y: 1000.0,
            width: 0.0,
            height: 0.0,
            properties: BTreeMap::new(),
        },
        MapObject {
            id: 2,
            name: "Lobby Chat".to_string(),
            object_type: "ConversationArea".to_string(),
            x: 2000.0,
            y: 950.0,
            width: 120.0,
            height: 150.0,
            properties: BTreeMap::new(),
        },
        MapObject {
            id: 3,
            name: "Cinema".to_string(),
            object_type: "ViewingArea".to_string(),
            x: 100.0,
            y: 100.0,
            width: 300.0,
            height: 200.0,
            properties: BTreeMap::new(),
        },
        MapObject {
            id: 4,
            name: "North Door".to_string(),
            object_type: "Transporter".to_string(),
            x: 2400.0,
            y: 900.0,
            width: 64.0,
            height: 64.0,
            properties: transporter_props,
        },
    ]
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    info!("Plaza Sim v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    let pump = std::env::var("PLAZA_SERVER_URL")
        .ok()
        .map(SocketPump::connect);

    demo_session(pump.as_ref())?;

    if let Some(pump) = pump {
        pump.shutdown();
    }
    Ok(())
}

/// Run the scripted town session.
fn demo_session(pump: Option<&SocketPump>) -> Result<()> {
    info!("=== Starting Demo Session ===");

    let local = PlayerId::random();
    info!("Local player: {}", local.to_uuid_string());

    let mut scene = TownScene::new(local, SceneConfig::default());

    // Continuation queued before setup; released once the latch fires.
    scene.on_ready(|| info!("scene reported ready"));

    let initial = scene.initialize(&demo_object_layer())?;
    send(pump, ClientMessage::Movement(initial));

    for zone in scene.zones() {
        info!("zone {}: {} ({:?})", zone.id, zone.name, zone.kind);
    }

    scene.attach_audio_output(Box::new(DemoSpeaker));
    let effects = scene.subscribe(|event| match event {
        SceneEvent::PianoPlayed => info!("effect: piano shakes"),
        SceneEvent::PlayerListening { .. } => info!("effect: note glyphs float up"),
        SceneEvent::ShowPiano => info!("effect: piano overlay opens"),
        SceneEvent::ClosePiano => info!("effect: piano overlay closes"),
    });

    // The spawn point sits inside the Lobby Chat conversation area.
    scene.register_zone_exit(2, local, || info!("left the Lobby Chat conversation"));

    let walls = MapWalls {
        bounds: Rect::new(0.0, 0.0, 3200.0, 2400.0),
    };

    // --- Walk right toward the piano -------------------------------------
    scene.key_down(KeyCode::ARROW_RIGHT);
    let mut emits = 0;
    for _ in 0..30 {
        let result = tick(&mut scene, &walls, DT)?;
        if let Some(location) = result.movement {
            emits += 1;
            send(pump, ClientMessage::Movement(location));
        }
        for zone in result.zone_exits {
            info!("exit callback fired for zone {zone}");
        }
    }
    scene.key_up(KeyCode::ARROW_RIGHT);
    info!("walk segment: 30 ticks, {emits} movement emits");

    // --- Idle: de-duplication keeps the channel quiet --------------------
    let mut emits = 0;
    for _ in 0..60 {
        if let Some(location) = tick(&mut scene, &walls, DT)?.movement {
            emits += 1;
            send(pump, ClientMessage::Movement(location));
        }
    }
    info!("idle segment: 60 ticks, {emits} movement emits");

    // --- Opposite holds resolve by fixed priority ------------------------
    scene.key_down(KeyCode::ARROW_RIGHT);
    scene.key_down(KeyCode::A);
    let result = tick(&mut scene, &walls, DT)?;
    if let Some(location) = result.movement {
        info!(
            "left+right held together resolves {:?}",
            location.rotation
        );
        send(pump, ClientMessage::Movement(location));
    }
    scene.key_up(KeyCode::ARROW_RIGHT);
    scene.key_up(KeyCode::A);
    tick(&mut scene, &walls, DT)?;

    // --- Piano overlay: pause, frozen ticks, resume ----------------------
    if scene.try_open_piano() {
        scene.key_down(KeyCode::ARROW_LEFT);
        for _ in 0..10 {
            let result = tick(&mut scene, &walls, DT)?;
            assert!(result.movement.is_none(), "paused tick must not move");
        }
        scene.key_up(KeyCode::ARROW_LEFT);
        info!("10 held-key ticks while paused produced no movement");
        scene.close_piano();
    }

    // --- Drain anything a live server pushed while we walked -------------
    if let Some(pump) = pump {
        for message in pump.drain_inbound() {
            dispatch(&mut scene, message);
        }
    }

    // --- Remote players arrive -------------------------------------------
    let ada = PlayerId::new([2; 16]);
    let grace = PlayerId::new([3; 16]);
    let roster = |players: Vec<(PlayerId, &str)>| ServerMessage::PlayersChanged {
        players: players
            .into_iter()
            .map(|(player_id, name)| PlayerInfo {
                player_id,
                user_name: name.to_string(),
                location: PlayerLocation::at(PIANO_POSITION),
            })
            .collect(),
    };
    dispatch(&mut scene, roster(vec![(ada, "ada"), (grace, "grace")]));
    info!("roster now has {} players", scene.roster().len());

    // --- Proximity audio at three listener distances ---------------------
    for distance in [40.0, 225.0, 500.0] {
        let listener = PlayerLocation::at(PIANO_POSITION.add(Vec2::new(distance, 0.0)));
        send(pump, ClientMessage::Movement(scene.move_local_to(listener)?));
        let decision = scene.handle_play_note(&NoteIntent::new("C4", ada));
        info!("play at distance {distance}: {decision:?}");
        dispatch(&mut scene, ServerMessage::StopNote(NoteIntent::new("C4", ada)));
    }

    // --- Mute gates audio, never visuals ---------------------------------
    send(
        pump,
        ClientMessage::Movement(scene.move_local_to(PlayerLocation::at(PIANO_POSITION))?),
    );
    if let Some(label) = scene.toggle_mute() {
        info!("mute toggled, label now '{label}'");
    }
    let decision = scene.handle_play_note(&NoteIntent::new("E4", grace));
    info!("muted play: {decision:?}");
    scene.toggle_mute();

    // --- A player drops mid-overlap and mid-note -------------------------
    scene.register_zone_exit(3, ada, || info!("ada's viewing session ended"));
    scene.handle_play_note(&NoteIntent::new("G4", ada));
    dispatch(&mut scene, roster(vec![(grace, "grace")]));
    info!("roster now has {} players", scene.roster().len());

    scene.unsubscribe(effects);
    scene.shutdown();

    info!("=== Demo Session Complete ===");
    Ok(())
}

/// Forward an outbound message to the socket pump, if one is connected.
fn send(pump: Option<&SocketPump>, message: ClientMessage) {
    if let Some(pump) = pump {
        pump.send(message);
    }
}
