use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(name = "kpmenu")]
#[command(version)]
#[command(about = "Dmenu/rofi/wofi frontend for KeePass databases", long_about = None)]
pub struct Cli {
    /// 캐시 타임아웃을 무시하고 상주하는 데몬으로 시작
    #[arg(long)]
    pub daemon: bool,

    /// Autotype 시작
    #[arg(long)]
    pub autotype: bool,

    /// 실행 중인 데몬 종료
    #[arg(short = 'q', long)]
    pub quit: bool,

    /// 설정 파일 경로 (기본: ~/.config/kpmenu/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    // General
    /// 사용할 메뉴 (dmenu, rofi, wofi, custom)
    #[arg(short = 'm', long)]
    pub menu: Option<String>,

    /// 사용할 클립보드 도구 (xsel, wl-clipboard, custom)
    #[arg(long = "clipboardTool")]
    pub clipboard_tool: Option<String>,

    /// 클립보드 타임아웃 (0 = 비우지 않음)
    #[arg(short = 'c', long = "clipboardTimeout")]
    pub clipboard_timeout: Option<String>,

    /// 데이터베이스 캐시 비활성화
    #[arg(short = 'n', long = "nocache")]
    pub no_cache: bool,

    /// 처음 한 번만 캐시 (사용해도 연장되지 않음)
    #[arg(long = "cacheOneTime")]
    pub cache_one_time: bool,

    /// 캐시 타임아웃
    #[arg(long = "cacheTimeout")]
    pub cache_timeout: Option<String>,

    /// OTP 처리 비활성화
    #[arg(long = "nootp")]
    pub no_otp: bool,

    /// Autotype 비활성화
    #[arg(long = "noautotype")]
    pub no_autotype: bool,

    /// 선택지가 하나여도 autotype 확인
    #[arg(long = "autotypealwaysconfirm")]
    pub autotype_always_confirm: bool,

    /// 활성 창 제목 대신 엔트리를 직접 선택
    #[arg(long = "autotypeusersel")]
    pub autotype_user_sel: bool,

    /// 모든 엔트리에 사용할 autotype 시퀀스
    #[arg(long = "autotypeSequence")]
    pub autotype_sequence: Option<String>,

    // Executable
    #[arg(long = "customPromptPassword")]
    pub custom_prompt_password: Option<String>,

    #[arg(long = "customPromptMenu")]
    pub custom_prompt_menu: Option<String>,

    #[arg(long = "customPromptEntries")]
    pub custom_prompt_entries: Option<String>,

    #[arg(long = "customPromptFields")]
    pub custom_prompt_fields: Option<String>,

    #[arg(long = "customClipboardCopy")]
    pub custom_clipboard_copy: Option<String>,

    #[arg(long = "customClipboardPaste")]
    pub custom_clipboard_paste: Option<String>,

    #[arg(long = "customClipboardClean")]
    pub custom_clipboard_clean: Option<String>,

    /// 활성 창 제목을 출력하는 명령
    #[arg(long = "customAutotypeWindowID")]
    pub custom_autotype_window_id: Option<String>,

    /// 키 입력을 대신할 실행 파일 ("echo"면 응답으로 출력)
    #[arg(long = "customAutotypeTyper")]
    pub custom_autotype_typer: Option<String>,

    // Style
    /// 비밀번호 입력 시 dmenu 배경/글자 색
    #[arg(long = "passwordBackground")]
    pub password_background: Option<String>,

    #[arg(long = "textPassword")]
    pub text_password: Option<String>,

    #[arg(long = "textMenu")]
    pub text_menu: Option<String>,

    #[arg(long = "textEntry")]
    pub text_entry: Option<String>,

    #[arg(long = "textField")]
    pub text_field: Option<String>,

    #[arg(long = "argsPassword", allow_hyphen_values = true)]
    pub args_password: Option<String>,

    #[arg(long = "argsMenu", allow_hyphen_values = true)]
    pub args_menu: Option<String>,

    #[arg(long = "argsEntry", allow_hyphen_values = true)]
    pub args_entry: Option<String>,

    #[arg(long = "argsField", allow_hyphen_values = true)]
    pub args_field: Option<String>,

    /// 엔트리 목록 템플릿 (예: "{Title} - {UserName}")
    #[arg(long = "formatEntry")]
    pub format_entry: Option<String>,

    // Database
    /// KeePass 데이터베이스 경로
    #[arg(short = 'd', long)]
    pub database: Option<String>,

    /// 키 파일 경로
    #[arg(short = 'k', long)]
    pub keyfile: Option<String>,

    /// 데이터베이스 비밀번호
    #[arg(short = 'p', long)]
    pub password: Option<String>,

    /// 필드 선택 시 표시 순서 (공백 구분)
    #[arg(long = "fieldOrder")]
    pub field_order: Option<String>,

    /// 나머지 필드도 표시 (`--fillOtherFields=false`로 끌 수 있음)
    #[arg(long = "fillOtherFields", num_args = 0..=1, default_missing_value = "true")]
    pub fill_other_fields: Option<String>,

    /// 표시하지 않을 필드 (공백 구분)
    #[arg(long = "fillBlacklist")]
    pub fill_blacklist: Option<String>,
}

impl Cli {
    /// 명시적으로 주어진 옵션만 (플래그 이름, 값) 쌍으로 변환
    pub fn overrides(&self) -> Vec<(&'static str, String)> {
        let values: [(&'static str, &Option<String>); 30] = [
            ("menu", &self.menu),
            ("clipboardTool", &self.clipboard_tool),
            ("clipboardTimeout", &self.clipboard_timeout),
            ("cacheTimeout", &self.cache_timeout),
            ("autotypeSequence", &self.autotype_sequence),
            ("customPromptPassword", &self.custom_prompt_password),
            ("customPromptMenu", &self.custom_prompt_menu),
            ("customPromptEntries", &self.custom_prompt_entries),
            ("customPromptFields", &self.custom_prompt_fields),
            ("customClipboardCopy", &self.custom_clipboard_copy),
            ("customClipboardPaste", &self.custom_clipboard_paste),
            ("customClipboardClean", &self.custom_clipboard_clean),
            ("customAutotypeWindowID", &self.custom_autotype_window_id),
            ("customAutotypeTyper", &self.custom_autotype_typer),
            ("passwordBackground", &self.password_background),
            ("textPassword", &self.text_password),
            ("textMenu", &self.text_menu),
            ("textEntry", &self.text_entry),
            ("textField", &self.text_field),
            ("argsPassword", &self.args_password),
            ("argsMenu", &self.args_menu),
            ("argsEntry", &self.args_entry),
            ("argsField", &self.args_field),
            ("formatEntry", &self.format_entry),
            ("database", &self.database),
            ("keyfile", &self.keyfile),
            ("password", &self.password),
            ("fieldOrder", &self.field_order),
            ("fillOtherFields", &self.fill_other_fields),
            ("fillBlacklist", &self.fill_blacklist),
        ];
        let switches = [
            ("nocache", self.no_cache),
            ("cacheOneTime", self.cache_one_time),
            ("nootp", self.no_otp),
            ("noautotype", self.no_autotype),
            ("autotypealwaysconfirm", self.autotype_always_confirm),
            ("autotypeusersel", self.autotype_user_sel),
        ];

        let mut overrides: Vec<(&'static str, String)> = values
            .into_iter()
            .filter_map(|(name, value)| value.as_ref().map(|v| (name, v.clone())))
            .collect();
        overrides.extend(
            switches
                .into_iter()
                .filter(|(_, on)| *on)
                .map(|(name, _)| (name, "true".to_string())),
        );
        overrides
    }
}
