/// Dashboard served when no `index.html` is configured. Plays the distraction
/// clip while `active` is set and reports `ready_to_hide` once loaded.
pub const INDEX_HTML: &str = r#"<!doctype html>
<html>
<head>
    <meta charset="utf-8">
    <title>Focus Watch</title>
    <style>
        body { margin:0; background:#111; color:#eee; font-family:sans-serif; height:100vh;
               display:flex; flex-direction:column; align-items:center; justify-content:center; }
        #state { font-size:32px; letter-spacing:2px; }
        #state.active { color:#ff5050; }
        video { display:none; max-width:100vw; max-height:80vh; margin-top:16px; }
        body.active video { display:block; }
        #conn { position:fixed; bottom:8px; right:12px; font:12px monospace; color:#777; }
    </style>
</head>
<body>
    <div id="state">FOCUSED</div>
    <video id="clip" src="/video" loop playsinline></video>
    <span id="conn">connecting</span>
    <script>
    (function(){
        const state = document.getElementById('state');
        const clip = document.getElementById('clip');
        const conn = document.getElementById('conn');
        const render = (active)=>{
            document.body.classList.toggle('active', active);
            state.classList.toggle('active', active);
            state.textContent = active ? 'DISTRACTED' : 'FOCUSED';
            if(active){ clip.currentTime = 0; clip.play().catch(()=>{}); } else { clip.pause(); }
        };
        const connect = ()=>{
            const ws = new WebSocket((location.protocol==='https:'?'wss://':'ws://')+location.host+'/ws');
            ws.onopen = ()=>{ conn.textContent='connected'; ws.send(JSON.stringify({event:'ready_to_hide'})); };
            ws.onclose = ()=>{ conn.textContent='disconnected'; setTimeout(connect, 1000); };
            ws.onmessage = (ev)=>{
                const msg = JSON.parse(ev.data);
                if(msg.event==='status'){ render(!!msg.active); }
            };
        };
        connect();
    })();
    </script>
</body>
</html>
"#;
